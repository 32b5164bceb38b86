//! In-memory, query-keyed cache of server-derived collections.
//!
//! This module provides the synchronization layer between views and the
//! remote API. It supports:
//!
//! - Stale-while-revalidate reads with a per-query stale time
//! - De-duplication of concurrent fetches for the same key
//! - Synchronous snapshots for optimistic writes and exact rollback
//! - Exact and prefix invalidation without blanking displayed data
//! - Cancel-wins suppression of in-flight results
//! - Change notification via a broadcast subscription

pub mod entry;
pub mod key;
pub mod store;
pub mod subscription;

pub use crate::Error;

pub use entry::{QueryEntry, QueryOptions, QueryStatus};
pub use key::{KeyPart, QueryKey};
pub use store::CollectionCache;
pub use subscription::{Change, Subscription};
