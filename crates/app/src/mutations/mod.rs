//! Post mutation flows.
//!
//! Create is not optimistic: the owner's posts are invalidated once the
//! server confirms. Delete removes the post from the cached list first and
//! restores the captured snapshot if the server rejects it.

pub mod create_post;
pub mod delete_post;

pub use create_post::CreatePostFlow;
pub use delete_post::DeletePostFlow;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use postr_core::{CollectionCache, Error, QueryKey};

pub const CREATE_SUCCESS: &str = "Post created successfully!";
pub const CREATE_FAILURE: &str = "Failed to create post. Please try again.";
pub const DELETE_SUCCESS: &str = "Post deleted successfully!";
pub const DELETE_FAILURE: &str = "Failed to delete post. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Delete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// A write in progress, holding what is needed to undo it.
#[derive(Debug)]
pub struct PendingMutation<T> {
    pub target_key: QueryKey,
    pub previous_snapshot: Option<Arc<T>>,
    pub kind: MutationKind,
}

impl<T: Send + Sync + 'static> PendingMutation<T> {
    /// Capture the current data under `target_key`.
    pub fn capture(cache: &CollectionCache, target_key: QueryKey, kind: MutationKind) -> Self {
        let previous_snapshot = cache.get_snapshot::<T>(&target_key);
        Self { target_key, previous_snapshot, kind }
    }

    /// Put the captured snapshot back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::Rollback` when nothing was captured.
    pub fn rollback(self, cache: &CollectionCache) -> Result<(), Error> {
        match self.previous_snapshot {
            Some(snapshot) => {
                cache.restore(&self.target_key, snapshot);
                Ok(())
            }
            None => Err(Error::Rollback(self.target_key.to_string())),
        }
    }
}

/// Shared status cell for a flow.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusCell(Arc<Mutex<MutationStatus>>);

impl StatusCell {
    fn lock(&self) -> MutexGuard<'_, MutationStatus> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self) -> MutationStatus {
        *self.lock()
    }

    pub(crate) fn set(&self, status: MutationStatus) {
        *self.lock() = status;
    }

    /// Move to Pending unless already there. Returns false if it was.
    pub(crate) fn begin(&self) -> bool {
        let mut status = self.lock();
        if *status == MutationStatus::Pending {
            return false;
        }
        *status = MutationStatus::Pending;
        true
    }
}

/// Held by a submit across its remote call.
///
/// If the submit future is dropped before `settle`, the flow returns to
/// Idle and `resync` is invalidated so the list re-syncs with the server.
pub(crate) struct SettleGuard {
    status: StatusCell,
    cache: CollectionCache,
    resync: QueryKey,
    settled: bool,
}

impl SettleGuard {
    pub(crate) fn new(status: &StatusCell, cache: &CollectionCache, resync: QueryKey) -> Self {
        Self { status: status.clone(), cache: cache.clone(), resync, settled: false }
    }

    pub(crate) fn settle(mut self, status: MutationStatus) {
        self.settled = true;
        self.status.set(status);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("mutation on {} abandoned before it settled, resyncing", self.resync);
        self.cache.invalidate(&self.resync);
        self.status.set(MutationStatus::Idle);
    }
}
