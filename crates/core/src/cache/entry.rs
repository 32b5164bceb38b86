//! Query entry state as seen by readers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::key::QueryKey;
use crate::Error;

/// Lifecycle of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched, or a fetch was cancelled before any data arrived.
    Idle,
    /// First fetch in flight, nothing to show yet.
    Pending,
    Success,
    /// Last fetch failed. Earlier data, if any, is still available.
    Error,
}

/// Per-query options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Overrides the cache-wide stale time for this query.
    pub stale_time: Option<Duration>,
}

impl QueryOptions {
    pub fn stale_time(stale_time: Duration) -> Self {
        Self { stale_time: Some(stale_time) }
    }
}

/// Read-only view of one cache slot.
///
/// Data is shared behind `Arc`; the cache never hands out a mutable
/// reference.
#[derive(Debug, Clone)]
pub struct QueryEntry<T> {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Error>,
    pub fetched_at: Option<Instant>,
    /// A fetch for this key is in flight.
    pub is_fetching: bool,
    /// Marked stale by `invalidate`; the next query refetches.
    pub is_invalidated: bool,
}

impl<T> QueryEntry<T> {
    pub(crate) fn idle(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            is_fetching: false,
            is_invalidated: false,
        }
    }

    /// Nothing to show yet and nothing went wrong.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.status != QueryStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}
