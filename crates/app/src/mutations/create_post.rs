//! Create a post, then re-sync the owner's posts.

use std::sync::Arc;

use postr_client::RemoteCollectionClient;
use postr_core::{CollectionCache, Error, NewPost, Post};

use super::{CREATE_FAILURE, CREATE_SUCCESS, MutationStatus, SettleGuard, StatusCell};
use crate::keys;
use crate::notifications::Notifier;

#[derive(Clone)]
pub struct CreatePostFlow {
    cache: CollectionCache,
    remote: Arc<dyn RemoteCollectionClient>,
    notifier: Notifier,
    status: StatusCell,
}

impl CreatePostFlow {
    pub fn new(cache: CollectionCache, remote: Arc<dyn RemoteCollectionClient>, notifier: Notifier) -> Self {
        Self { cache, remote, notifier, status: StatusCell::default() }
    }

    pub fn status(&self) -> MutationStatus {
        self.status.get()
    }

    /// Validate and submit `post`.
    ///
    /// Invalid input is returned without a request, cache change or
    /// notification. A submit while the previous one is pending is refused.
    /// Dropping the future mid-request resets the flow to Idle and
    /// invalidates the owner's posts.
    pub async fn submit(&self, post: NewPost) -> Result<Post, Error> {
        post.validate()?;

        if !self.status.begin() {
            return Err(Error::MutationInFlight(format!("create post for {}", post.user_id)));
        }
        let owner_key = keys::user_posts(&post.user_id);
        let guard = SettleGuard::new(&self.status, &self.cache, owner_key.clone());

        match self.remote.create_post(&post).await {
            Ok(created) => {
                tracing::debug!("created post {} for user {}", created.id, post.user_id);
                self.cache.invalidate(&owner_key);
                guard.settle(MutationStatus::Success);
                self.notifier.success(CREATE_SUCCESS);
                Ok(created)
            }
            Err(err) => {
                tracing::warn!(user_id = %post.user_id, error = %err, "create post failed");
                guard.settle(MutationStatus::Error);
                self.notifier.error(CREATE_FAILURE);
                Err(err)
            }
        }
    }
}
