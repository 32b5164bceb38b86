//! List views bound to the navigable location.
//!
//! A view reads its cursor from the current location, queries the cache and
//! derives a [`RenderState`] from the entry. Views never write the cache
//! except through the mutation flows.

pub mod posts;
pub mod users;

pub use posts::{PostsRender, PostsView};
pub use users::UsersView;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use postr_core::{Error, QueryEntry};

use crate::app::App;
use crate::error::display_message;
use crate::location::Route;

pub(crate) type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'static>>;

/// What a view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState<T> {
    /// Nothing to show yet.
    Loading,
    /// The first load failed.
    Error { message: String },
    Ready {
        data: Arc<T>,
        /// A fetch is in flight for the shown data.
        refreshing: bool,
        /// The last refetch failed; `data` is from an earlier success.
        refresh_error: Option<String>,
        /// `data` belongs to the previous cursor while the current one loads.
        placeholder: bool,
    },
}

impl<T> RenderState<T> {
    /// Derive the state from `entry`, falling back to `placeholder` while it loads.
    pub fn from_entry(entry: &QueryEntry<T>, placeholder: Option<Arc<T>>) -> Self {
        let error = entry.error.as_ref().filter(|_| entry.is_error()).map(display_message);

        if let Some(data) = &entry.data {
            return RenderState::Ready {
                data: Arc::clone(data),
                refreshing: entry.is_fetching,
                refresh_error: error,
                placeholder: false,
            };
        }
        if let Some(message) = error {
            return RenderState::Error { message };
        }
        match placeholder {
            Some(data) => RenderState::Ready { data, refreshing: true, refresh_error: None, placeholder: true },
            None => RenderState::Loading,
        }
    }

    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            RenderState::Ready { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading)
    }
}

/// The view addressed by the current location.
pub enum View {
    Users(UsersView),
    Posts(PostsView),
}

impl View {
    pub fn for_current(app: &App) -> Self {
        match app.navigator.current().route() {
            Route::Users => View::Users(UsersView::new(app)),
            Route::UserPosts { user_id } => View::Posts(PostsView::new(app, user_id)),
        }
    }
}
