//! Views, mutation flows and navigation for postr.
//!
//! This crate provides:
//! - The users and posts list views, bound to the navigable location
//! - Create and delete post flows with notifications
//! - Location parsing and an in-memory navigation history
//! - The [`App`] context that wires the cache, remote client and navigator

pub mod app;
pub mod error;
pub mod keys;
pub mod location;
pub mod mutations;
pub mod notifications;
pub mod text;
pub mod views;

pub use app::App;
pub use error::{AppError, FALLBACK_MESSAGE, display_message};
pub use location::{Location, NavState, Navigator, Route};
pub use mutations::{CreatePostFlow, DeletePostFlow, MutationKind, MutationStatus, PendingMutation};
pub use notifications::{Level, Notification, Notifier};
pub use views::{PostsRender, PostsView, RenderState, UsersView, View};
