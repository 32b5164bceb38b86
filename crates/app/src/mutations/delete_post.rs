//! Optimistic post deletion with rollback.

use std::sync::Arc;

use postr_client::RemoteCollectionClient;
use postr_core::validation::validate_id;
use postr_core::{CollectionCache, Error, Post, QueryKey};

use super::{DELETE_FAILURE, DELETE_SUCCESS, MutationKind, MutationStatus, PendingMutation, SettleGuard, StatusCell};
use crate::notifications::Notifier;

#[derive(Clone)]
pub struct DeletePostFlow {
    cache: CollectionCache,
    remote: Arc<dyn RemoteCollectionClient>,
    notifier: Notifier,
    status: StatusCell,
}

impl DeletePostFlow {
    pub fn new(cache: CollectionCache, remote: Arc<dyn RemoteCollectionClient>, notifier: Notifier) -> Self {
        Self { cache, remote, notifier, status: StatusCell::default() }
    }

    pub fn status(&self) -> MutationStatus {
        self.status.get()
    }

    /// Delete `post_id` from the list cached under `owner_key`.
    ///
    /// The in-flight fetch for `owner_key` is cancelled so it cannot
    /// overwrite the optimistic list. On failure the captured list is put
    /// back as-is; without one the key is invalidated instead. Dropping the
    /// future mid-request also invalidates the key so the list re-syncs.
    pub async fn submit(&self, post_id: &str, owner_key: &QueryKey) -> Result<(), Error> {
        validate_id(post_id)?;
        self.status.set(MutationStatus::Pending);
        let guard = SettleGuard::new(&self.status, &self.cache, owner_key.clone());

        self.cache.cancel(owner_key);
        let pending = PendingMutation::<Vec<Post>>::capture(&self.cache, owner_key.clone(), MutationKind::Delete);
        if let Some(previous) = &pending.previous_snapshot {
            self.cache.set_snapshot(owner_key, |_: Option<&Vec<Post>>| {
                previous.iter().filter(|post| post.id != post_id).cloned().collect()
            });
        }

        match self.remote.delete_post(post_id).await {
            Ok(()) => {
                tracing::debug!("deleted post {}", post_id);
                self.cache.invalidate(owner_key);
                guard.settle(MutationStatus::Success);
                self.notifier.success(DELETE_SUCCESS);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(post_id = %post_id, error = %err, "delete post failed");
                if let Err(rollback) = pending.rollback(&self.cache) {
                    tracing::error!(error = %rollback, "rollback failed, invalidating instead");
                    self.cache.invalidate(owner_key);
                }
                guard.settle(MutationStatus::Error);
                self.notifier.error(DELETE_FAILURE);
                Err(err)
            }
        }
    }
}
