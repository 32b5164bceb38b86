//! Plain-text rendering of view states for the terminal host.

use std::fmt::Write as _;

use postr_core::{Page, PageItem, Pager, User};

use crate::views::{PostsRender, RenderState};

const LOADING: &str = "Loading…";

/// Render the users table, pager and optional total.
pub fn users(state: &RenderState<Page<User>>, pager: &Pager, total_users: Option<u64>) -> String {
    let mut out = String::from("Users\n");
    if let Some(total) = total_users {
        let _ = writeln!(out, "{total} users");
    }

    match state {
        RenderState::Loading => out.push_str(LOADING),
        RenderState::Error { message } => {
            let _ = write!(out, "{message}.");
        }
        RenderState::Ready { data, refresh_error, .. } => {
            if data.is_empty() {
                out.push_str("No users on this page.\n");
            }
            for user in &data.items {
                let _ = writeln!(out, "{} | {} | {}", user.full_name(), user.email, user.address_line());
            }
            if let Some(message) = refresh_error {
                let _ = writeln!(out, "({message})");
            }
            out.push_str(&pager_line(pager));
        }
    }
    out
}

/// `‹ 1 2 [3] 4 … 9 10 ›`, with the arrows dropped at the boundaries.
pub fn pager_line(pager: &Pager) -> String {
    let mut parts = Vec::new();
    if pager.has_prev() {
        parts.push("‹".to_string());
    }
    for item in pager.window() {
        match item {
            PageItem::Page(n) if n == pager.current() => parts.push(format!("[{n}]")),
            other => parts.push(other.to_string()),
        }
    }
    if pager.has_next() {
        parts.push("›".to_string());
    }
    parts.join(" ")
}

/// Render the user header and their posts.
pub fn posts(render: &PostsRender) -> String {
    let mut out = String::new();

    match &render.user {
        RenderState::Ready { data, .. } => {
            let _ = writeln!(out, "{}", data.full_name());
            let _ = writeln!(out, "{} • {}", data.email, render.post_count_label().unwrap_or_default());
        }
        RenderState::Loading => {
            let _ = writeln!(out, "{LOADING}");
        }
        RenderState::Error { message } => {
            let _ = writeln!(out, "{message}.");
        }
    }

    match &render.posts {
        RenderState::Loading => out.push_str(LOADING),
        RenderState::Error { message } => {
            let _ = write!(out, "{message}.");
        }
        RenderState::Ready { data, .. } => {
            for post in data.iter() {
                let _ = writeln!(out, "\n[{}] {}\n{}", post.id, post.title, post.body);
            }
        }
    }
    out
}
