//! Navigable locations and history.
//!
//! Two routes exist: `/users?page=N` and `/users/{id}/posts`. The users page
//! cursor lives in the `page` query parameter. Navigating to a user's posts
//! carries the page to return to in forward-navigation state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use postr_core::Error;
use serde::{Deserialize, Serialize};
use url::Url;

/// Base used to resolve relative locations. Never leaves this module.
const LOCATION_BASE: &str = "http://postr.local/";

/// Which view a location addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Users,
    UserPosts { user_id: String },
}

/// State attached to a forward navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    /// Users page to return to.
    pub page: Option<u32>,
}

/// A parsed location plus its navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    route: Route,
    page: Option<u32>,
    state: NavState,
}

impl Location {
    /// `/users`, or `/users?page=N` when `page` is given.
    pub fn users(page: Option<u32>) -> Self {
        Self { route: Route::Users, page: page.map(|p| p.max(1)), state: NavState::default() }
    }

    /// `/users/{id}/posts` carrying `state`.
    pub fn user_posts(user_id: impl Into<String>, state: NavState) -> Self {
        Self { route: Route::UserPosts { user_id: user_id.into() }, page: None, state }
    }

    /// Parse a path with optional query, e.g. `/users?page=3`.
    ///
    /// A missing, non-numeric or zero `page` reads as page 1. The root path
    /// addresses the users list.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let base = Url::parse(LOCATION_BASE).map_err(|e| Error::InvalidLocation(e.to_string()))?;
        let url = base
            .join(input.trim())
            .map_err(|e| Error::InvalidLocation(format!("{input}: {e}")))?;
        if url.host_str() != base.host_str() {
            return Err(Error::InvalidLocation(format!("{input}: not a local path")));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let route = match segments.as_slice() {
            [] | ["users"] => Route::Users,
            ["users", user_id, "posts"] => Route::UserPosts { user_id: (*user_id).to_string() },
            _ => return Err(Error::InvalidLocation(format!("{input}: unknown path"))),
        };

        let page = match route {
            Route::Users => url
                .query_pairs()
                .find(|(name, _)| name == "page")
                .map(|(_, value)| parse_page(&value)),
            Route::UserPosts { .. } => None,
        };

        Ok(Self { route, page, state: NavState::default() })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Users page addressed by this location; 1 when absent.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Same location with the `page` parameter replaced.
    pub fn with_page(&self, page: u32) -> Self {
        Self { page: Some(page.max(1)), ..self.clone() }
    }
}

fn parse_page(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(page) if page >= 1 => page,
        _ => {
            tracing::debug!("ignoring invalid page parameter {:?}", value);
            1
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.route {
            Route::Users => match self.page {
                Some(page) => write!(f, "/users?page={page}"),
                None => f.write_str("/users"),
            },
            Route::UserPosts { user_id } => write!(f, "/users/{user_id}/posts"),
        }
    }
}

#[derive(Debug)]
struct History {
    entries: Vec<Location>,
    index: usize,
}

/// In-memory navigation history shared by the views.
///
/// `push` drops any forward entries, `replace` rewrites the current entry.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Arc<Mutex<History>>,
}

impl Navigator {
    pub fn new(initial: Location) -> Self {
        Self { history: Arc::new(Mutex::new(History { entries: vec![initial], index: 0 })) }
    }

    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Location {
        let history = self.history();
        history.entries[history.index].clone()
    }

    pub fn push(&self, location: Location) {
        tracing::debug!("navigate to {}", location);
        let mut history = self.history();
        let next = history.index + 1;
        history.entries.truncate(next);
        history.entries.push(location);
        history.index = next;
    }

    pub fn replace(&self, location: Location) {
        tracing::debug!("replace location with {}", location);
        let mut history = self.history();
        let index = history.index;
        history.entries[index] = location;
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let mut history = self.history();
        if history.index == 0 {
            return false;
        }
        history.index -= 1;
        true
    }

    /// Number of entries up to and including the current one.
    pub fn depth(&self) -> usize {
        self.history().index + 1
    }
}
