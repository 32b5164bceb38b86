//! The remote collection seam.

use async_trait::async_trait;
use postr_core::{Error, NewPost, Page, Post, User};

/// CRUD operations against the users and posts resources.
///
/// Implementations translate transport failures and malformed payloads into
/// [`Error::Transport`] and reject malformed identifiers with
/// [`Error::Validation`] before touching the network.
#[async_trait]
pub trait RemoteCollectionClient: Send + Sync {
    /// One page of users.
    async fn list_users(&self, page: u32, page_size: u32) -> Result<Page<User>, Error>;

    /// Total number of users.
    async fn count_users(&self) -> Result<u64, Error>;

    /// All posts owned by `user_id`.
    async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, Error>;

    async fn get_user(&self, user_id: &str) -> Result<User, Error>;

    /// Create a post and return it as stored by the server.
    async fn create_post(&self, post: &NewPost) -> Result<Post, Error>;

    async fn delete_post(&self, post_id: &str) -> Result<(), Error>;
}
