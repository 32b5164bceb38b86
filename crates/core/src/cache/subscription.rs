//! Change notifications for cache subscribers.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::key::QueryKey;
use crate::Error;

/// Receiver of cache change events.
///
/// Every write to a slot publishes the slot's key. A subscriber that falls
/// behind is told to re-read rather than replaying missed keys.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<QueryKey>,
}

/// What a subscriber should do after waking up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Key(QueryKey),
    /// Events were dropped; re-read everything of interest.
    Lagged,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<QueryKey>) -> Self {
        Self { rx }
    }

    /// Wait for the next change event.
    pub async fn next(&mut self) -> Result<Change, Error> {
        match self.rx.recv().await {
            Ok(key) => Ok(Change::Key(key)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("cache subscriber lagged by {} events", skipped);
                Ok(Change::Lagged)
            }
            Err(RecvError::Closed) => Err(Error::CacheClosed),
        }
    }

    /// Wait until `key` changes, or until events were dropped.
    pub async fn wait_for(&mut self, key: &QueryKey) -> Result<(), Error> {
        loop {
            match self.next().await? {
                Change::Key(changed) if &changed == key => return Ok(()),
                Change::Key(_) => continue,
                Change::Lagged => return Ok(()),
            }
        }
    }
}
