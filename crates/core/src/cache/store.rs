//! The collection cache store.
//!
//! Slots live in a `HashMap` behind a `std::sync::Mutex`. The lock is never
//! held across an await or while running caller-supplied closures, so every
//! operation except `query_settled` is synchronous.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::entry::{QueryEntry, QueryOptions, QueryStatus};
use super::key::QueryKey;
use super::subscription::Subscription;
use crate::Error;

/// Capacity of the change notification channel.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

type AnyData = Arc<dyn Any + Send + Sync>;

/// Internal state for one key.
struct Slot {
    status: QueryStatus,
    data: Option<AnyData>,
    error: Option<Error>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    /// Id of the fetch whose result may be applied. Cleared by cancel.
    in_flight: Option<u64>,
}

impl Slot {
    fn new() -> Self {
        Self { status: QueryStatus::Idle, data: None, error: None, fetched_at: None, invalidated: false, in_flight: None }
    }

    fn needs_fetch(&self, stale_time: Duration) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        if self.data.is_none() || self.invalidated {
            return true;
        }
        self.fetched_at.is_none_or(|at| at.elapsed() >= stale_time)
    }

    fn write(&mut self, data: AnyData) {
        self.data = Some(data);
        self.status = QueryStatus::Success;
        self.error = None;
        self.fetched_at = Some(Instant::now());
        self.invalidated = false;
    }

    /// Forget the in-flight fetch. Returns whether there was one.
    fn abandon_fetch(&mut self) -> bool {
        if self.in_flight.take().is_none() {
            return false;
        }
        if self.data.is_none() {
            self.status = if self.error.is_some() { QueryStatus::Error } else { QueryStatus::Idle };
        }
        true
    }

    fn view<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryEntry<T> {
        QueryEntry {
            key: key.clone(),
            status: self.status,
            data: self.data.as_ref().and_then(|data| downcast(key, data)),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            is_fetching: self.in_flight.is_some(),
            is_invalidated: self.invalidated,
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: &AnyData) -> Option<Arc<T>> {
    match Arc::clone(data).downcast::<T>() {
        Ok(typed) => Some(typed),
        Err(_) => {
            tracing::warn!(key = %key, "cache entry holds a different type than requested");
            None
        }
    }
}

struct CacheInner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    next_fetch_id: AtomicU64,
    updates: broadcast::Sender<QueryKey>,
    default_stale_time: Duration,
}

/// Query-keyed store of server-derived collections.
///
/// Cloning is cheap and yields a handle to the same store. Construct one per
/// application (or per test) and pass it to whatever needs it.
#[derive(Clone)]
pub struct CollectionCache {
    inner: Arc<CacheInner>,
}

impl Default for CollectionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CollectionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionCache")
            .field("entries", &self.slots().len())
            .field("default_stale_time", &self.inner.default_stale_time)
            .finish()
    }
}

impl CollectionCache {
    /// Create an empty cache where cached data is always stale.
    pub fn new() -> Self {
        Self::with_stale_time(Duration::ZERO)
    }

    /// Create an empty cache with a default stale time for all queries.
    pub fn with_stale_time(default_stale_time: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                slots: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                updates,
                default_stale_time,
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, key: &QueryKey) {
        // No receivers is fine.
        let _ = self.inner.updates.send(key.clone());
    }

    /// Subscribe to change events for all keys.
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.inner.updates.subscribe())
    }

    /// Return the current entry for `key`, starting a background fetch if needed.
    ///
    /// A fetch starts when the key has no data, was invalidated, or its data
    /// is at least `stale_time` old, and no fetch for the key is already in
    /// flight. Existing data stays visible while the refetch runs.
    ///
    /// The fetch runs on the current tokio runtime. Without one, or if the
    /// fetcher panics, the entry settles with `Error::FetchFailed`.
    pub fn query<T, F, Fut>(&self, key: &QueryKey, fetcher: F, options: QueryOptions) -> QueryEntry<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let stale_time = options.stale_time.unwrap_or(self.inner.default_stale_time);

        let (fetch_id, entry) = {
            let mut slots = self.slots();
            let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
            let fetch_id = if slot.needs_fetch(stale_time) {
                let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                slot.in_flight = Some(id);
                if slot.data.is_none() {
                    slot.status = QueryStatus::Pending;
                }
                Some(id)
            } else {
                None
            };
            (fetch_id, slot.view(key))
        };

        let Some(fetch_id) = fetch_id else {
            tracing::debug!("no fetch needed for {}", key);
            return entry;
        };

        let Ok(runtime) = Handle::try_current() else {
            tracing::error!("no tokio runtime to fetch {} on", key);
            self.settle(key, fetch_id, Err(Error::FetchFailed("no tokio runtime".into())));
            return self.entry(key);
        };

        tracing::debug!("fetching {} (fetch {})", key, fetch_id);
        self.notify(key);

        // The fetch gets its own task so a panic surfaces as a JoinError
        // here and the slot still settles.
        let fetch = runtime.spawn(fetcher());
        let cache = self.clone();
        let key = key.clone();
        runtime.spawn(async move {
            let result = match fetch.await {
                Ok(result) => result.map(|data| Arc::new(data) as AnyData),
                Err(err) => {
                    tracing::error!(key = %key, error = %err, "fetch task did not complete");
                    Err(Error::FetchFailed(err.to_string()))
                }
            };
            cache.settle(&key, fetch_id, result);
        });

        entry
    }

    /// Issue `query` and wait until no fetch for `key` is in flight.
    pub async fn query_settled<T, F, Fut>(&self, key: &QueryKey, fetcher: F, options: QueryOptions) -> QueryEntry<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let mut entry = self.query(key, fetcher, options);
        while entry.is_fetching {
            if subscription.wait_for(key).await.is_err() {
                break;
            }
            entry = self.entry(key);
        }
        entry
    }

    /// Apply a fetch result unless the fetch was cancelled or superseded.
    fn settle(&self, key: &QueryKey, fetch_id: u64, result: Result<AnyData, Error>) {
        {
            let mut slots = self.slots();
            let Some(slot) = slots.get_mut(key) else {
                return;
            };
            if slot.in_flight != Some(fetch_id) {
                tracing::debug!("discarding result of cancelled fetch {} for {}", fetch_id, key);
                return;
            }
            slot.in_flight = None;
            match result {
                Ok(data) => slot.write(data),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "fetch failed");
                    slot.status = QueryStatus::Error;
                    slot.error = Some(err);
                }
            }
        }
        self.notify(key);
    }

    /// Current entry for `key`, without side effects.
    pub fn entry<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryEntry<T> {
        self.slots()
            .get(key)
            .map(|slot| slot.view(key))
            .unwrap_or_else(|| QueryEntry::idle(key.clone()))
    }

    /// Current data for `key`, without side effects.
    pub fn get_snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.slots()
            .get(key)
            .and_then(|slot| slot.data.as_ref())
            .and_then(|data| downcast(key, data))
    }

    /// Replace the data for `key` with `updater(previous)` and mark it Success.
    ///
    /// The updater runs without the store lock held.
    pub fn set_snapshot<T, F>(&self, key: &QueryKey, updater: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> T,
    {
        let previous = self.get_snapshot::<T>(key);
        let next = Arc::new(updater(previous.as_deref()));
        self.write(key, Arc::clone(&next) as AnyData);
        next
    }

    /// Put back an earlier snapshot as-is.
    pub fn restore<T: Send + Sync + 'static>(&self, key: &QueryKey, snapshot: Arc<T>) {
        self.write(key, snapshot as AnyData);
    }

    fn write(&self, key: &QueryKey, data: AnyData) {
        self.slots().entry(key.clone()).or_insert_with(Slot::new).write(data);
        self.notify(key);
    }

    /// Mark `key` stale so the next query refetches. Displayed data is kept.
    ///
    /// A fetch already in flight started before the invalidation, so its
    /// result is discarded. Returns whether the key exists.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let found = {
            let mut slots = self.slots();
            match slots.get_mut(key) {
                Some(slot) => {
                    slot.invalidated = true;
                    if slot.abandon_fetch() {
                        tracing::debug!("invalidation supersedes in-flight fetch for {}", key);
                    }
                    true
                }
                None => false,
            }
        };
        if found {
            tracing::debug!("invalidated {}", key);
            self.notify(key);
        }
        found
    }

    /// Invalidate every key starting with `prefix`. Returns how many matched.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let keys: Vec<QueryKey> = self
            .slots()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.iter().filter(|key| self.invalidate(key)).count()
    }

    /// Drop the result of the in-flight fetch for `key`, if any.
    ///
    /// Entries without data fall back to Idle (or Error when the previous
    /// fetch failed). Returns whether a fetch was cancelled.
    pub fn cancel(&self, key: &QueryKey) -> bool {
        let cancelled = self.slots().get_mut(key).is_some_and(Slot::abandon_fetch);
        if cancelled {
            tracing::debug!("cancelled in-flight fetch for {}", key);
            self.notify(key);
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn counting<T: Send + 'static>(
        calls: &Arc<AtomicUsize>, value: Result<T, Error>,
    ) -> impl FnOnce() -> std::future::Ready<Result<T, Error>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(value)
        }
    }

    type Gated<T> = std::pin::Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

    fn gated<T: Send + 'static>(rx: oneshot::Receiver<()>, value: T) -> impl FnOnce() -> Gated<T> {
        move || -> Gated<T> {
            Box::pin(async move {
                let _ = rx.await;
                Ok(value)
            })
        }
    }

    fn key() -> QueryKey {
        QueryKey::new("userPosts").with("u1")
    }

    async fn let_tasks_run() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_first_query_is_pending_then_success() {
        let cache = CollectionCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let entry = cache.query(&key(), counting(&calls, Ok(vec![1u32, 2])), QueryOptions::default());
        assert_eq!(entry.status, QueryStatus::Pending);
        assert!(entry.is_loading());
        assert!(entry.is_fetching);

        let entry: QueryEntry<Vec<u32>> =
            cache.query_settled(&key(), counting(&calls, Ok(vec![9])), QueryOptions::default()).await;
        assert_eq!(entry.status, QueryStatus::Success);
        assert_eq!(entry.data.as_deref(), Some(&vec![1, 2]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_data_is_not_refetched() {
        let cache = CollectionCache::with_stale_time(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query_settled(&key(), counting(&calls, Ok(vec![1u32])), QueryOptions::default()).await;
        let entry: QueryEntry<Vec<u32>> =
            cache.query(&key(), counting(&calls, Ok(vec![2u32])), QueryOptions::default());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!entry.is_fetching);
        assert_eq!(entry.data.as_deref(), Some(&vec![1]));
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_fetch() {
        let cache = CollectionCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();

        let calls_first = Arc::clone(&calls);
        let first = gated(rx, vec![7u32]);
        cache.query(
            &key(),
            move || {
                calls_first.fetch_add(1, Ordering::SeqCst);
                first()
            },
            QueryOptions::default(),
        );
        let second: QueryEntry<Vec<u32>> =
            cache.query(&key(), counting(&calls, Ok(vec![8u32])), QueryOptions::default());

        assert!(second.is_fetching);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tx.send(()).unwrap();
        let_tasks_run().await;
        assert_eq!(cache.get_snapshot::<Vec<u32>>(&key()).as_deref(), Some(&vec![7]));
    }

    #[tokio::test]
    async fn test_stale_data_shown_while_revalidating() {
        let cache = CollectionCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.query_settled(&key(), counting(&calls, Ok(vec![1u32])), QueryOptions::default()).await;

        let (tx, rx) = oneshot::channel();
        let entry: QueryEntry<Vec<u32>> = cache.query(&key(), gated(rx, vec![1u32, 2]), QueryOptions::default());
        assert_eq!(entry.status, QueryStatus::Success);
        assert!(entry.is_fetching);
        assert_eq!(entry.data.as_deref(), Some(&vec![1]));

        tx.send(()).unwrap();
        let_tasks_run().await;
        assert_eq!(cache.get_snapshot::<Vec<u32>>(&key()).as_deref(), Some(&vec![1, 2]));
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_data() {
        let cache = CollectionCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.query_settled(&key(), counting(&calls, Ok(vec![1u32, 2])), QueryOptions::default()).await;

        let failure = Err(Error::Transport(TransportError::Http { status: 500, message: None }));
        let entry: QueryEntry<Vec<u32>> = cache.query_settled(&key(), counting(&calls, failure), QueryOptions::default()).await;

        assert_eq!(entry.status, QueryStatus::Error);
        assert!(entry.error.is_some());
        assert_eq!(entry.data.as_deref(), Some(&vec![1, 2]));
        assert!(!entry.is_loading());
    }

    #[tokio::test]
    async fn test_cancel_wins_over_late_result() {
        let cache = CollectionCache::new();
        let (tx, rx) = oneshot::channel();
        cache.query(&key(), gated(rx, vec![1u32]), QueryOptions::default());

        assert!(cache.cancel(&key()));
        let entry: QueryEntry<Vec<u32>> = cache.entry(&key());
        assert_eq!(entry.status, QueryStatus::Idle);
        assert!(!entry.is_fetching);

        tx.send(()).unwrap();
        let_tasks_run().await;
        assert!(cache.get_snapshot::<Vec<u32>>(&key()).is_none());
        assert!(!cache.cancel(&key()));
    }

    #[tokio::test]
    async fn test_panicking_fetcher_settles_as_error() {
        let cache = CollectionCache::new();
        let entry: QueryEntry<Vec<u32>> = cache.query(
            &key(),
            || -> Gated<Vec<u32>> {
                Box::pin(async {
                    let missing: Option<Vec<u32>> = None;
                    Ok(missing.expect("fetcher blew up"))
                })
            },
            QueryOptions::default(),
        );
        assert!(entry.is_fetching);
        let_tasks_run().await;

        let entry: QueryEntry<Vec<u32>> = cache.entry(&key());
        assert_eq!(entry.status, QueryStatus::Error);
        assert!(!entry.is_fetching);
        assert!(matches!(entry.error, Some(Error::FetchFailed(_))));

        let calls = Arc::new(AtomicUsize::new(0));
        let settled = tokio::time::timeout(
            Duration::from_secs(1),
            cache.query_settled(&key(), counting(&calls, Ok(vec![4u32])), QueryOptions::default()),
        )
        .await
        .expect("query after a panicked fetch settles");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(settled.data.as_deref(), Some(&vec![4]));
    }

    #[test]
    fn test_query_without_runtime_records_error() {
        let cache = CollectionCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let entry: QueryEntry<Vec<u32>> = cache.query(&key(), counting(&calls, Ok(vec![1u32])), QueryOptions::default());

        assert_eq!(entry.status, QueryStatus::Error);
        assert!(!entry.is_fetching);
        assert!(matches!(entry.error, Some(Error::FetchFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_protects_optimistic_value() {
        let cache = CollectionCache::new();
        cache.set_snapshot(&key(), |_: Option<&Vec<u32>>| vec![1, 2, 3]);

        let (tx, rx) = oneshot::channel();
        cache.query(&key(), gated(rx, vec![1u32, 2, 3]), QueryOptions::default());
        cache.cancel(&key());
        cache.set_snapshot(&key(), |prev: Option<&Vec<u32>>| {
            prev.map(|list| list.iter().copied().filter(|n| *n != 2).collect()).unwrap_or_default()
        });

        tx.send(()).unwrap();
        let_tasks_run().await;
        assert_eq!(cache.get_snapshot::<Vec<u32>>(&key()).as_deref(), Some(&vec![1, 3]));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_without_blanking() {
        let cache = CollectionCache::with_stale_time(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        cache.query_settled(&key(), counting(&calls, Ok(vec![1u32])), QueryOptions::default()).await;

        assert!(cache.invalidate(&key()));
        let entry: QueryEntry<Vec<u32>> = cache.entry(&key());
        assert!(entry.is_invalidated);
        assert_eq!(entry.data.as_deref(), Some(&vec![1]));

        let entry: QueryEntry<Vec<u32>> =
            cache.query_settled(&key(), counting(&calls, Ok(vec![2u32])), QueryOptions::default()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(entry.data.as_deref(), Some(&vec![2]));
        assert!(!entry.is_invalidated);
    }

    #[tokio::test]
    async fn test_invalidate_supersedes_in_flight_fetch() {
        let cache = CollectionCache::new();
        let (tx, rx) = oneshot::channel();
        cache.query(&key(), gated(rx, vec![1u32]), QueryOptions::default());

        cache.invalidate(&key());
        tx.send(()).unwrap();
        let_tasks_run().await;

        let entry: QueryEntry<Vec<u32>> = cache.entry(&key());
        assert!(entry.data.is_none());
        assert!(entry.is_invalidated);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key() {
        let cache = CollectionCache::new();
        assert!(!cache.invalidate(&key()));
    }

    #[tokio::test]
    async fn test_invalidate_prefix_hits_dependents() {
        let cache = CollectionCache::new();
        cache.set_snapshot(&QueryKey::new("users").with(1u32), |_: Option<&u8>| 1);
        cache.set_snapshot(&QueryKey::new("users").with(2u32), |_: Option<&u8>| 2);
        cache.set_snapshot(&QueryKey::new("userPosts").with("u1"), |_: Option<&u8>| 3);

        assert_eq!(cache.invalidate_prefix(&QueryKey::new("users")), 2);
        assert!(cache.entry::<u8>(&QueryKey::new("users").with(2u32)).is_invalidated);
        assert!(!cache.entry::<u8>(&QueryKey::new("userPosts").with("u1")).is_invalidated);
    }

    #[tokio::test]
    async fn test_restore_keeps_identical_snapshot() {
        let cache = CollectionCache::new();
        let original = cache.set_snapshot(&key(), |_: Option<&Vec<u32>>| vec![3, 1, 2]);
        let snapshot = cache.get_snapshot::<Vec<u32>>(&key()).unwrap();

        cache.set_snapshot(&key(), |_: Option<&Vec<u32>>| vec![3]);
        cache.restore(&key(), Arc::clone(&snapshot));

        let restored = cache.get_snapshot::<Vec<u32>>(&key()).unwrap();
        assert!(Arc::ptr_eq(&restored, &original));
        assert_eq!(*restored, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_type_mismatch_reads_as_missing() {
        let cache = CollectionCache::new();
        cache.set_snapshot(&key(), |_: Option<&Vec<u32>>| vec![1]);
        assert!(cache.get_snapshot::<String>(&key()).is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let cache = CollectionCache::new();
        let mut subscription = cache.subscribe();

        cache.set_snapshot(&QueryKey::new("other"), |_: Option<&u8>| 0);
        cache.set_snapshot(&key(), |_: Option<&u8>| 1);

        subscription.wait_for(&key()).await.unwrap();
    }
}
