//! Transient notifications emitted when a mutation settles.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// One toast. Only the most recent one is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds the current notification and fans new ones out to subscribers.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Arc<Mutex<Option<Notification>>>,
    visible_for: TimeDelta,
    updates: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(visible_for: Duration) -> Self {
        let (updates, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            current: Arc::new(Mutex::new(None)),
            visible_for: TimeDelta::from_std(visible_for).unwrap_or(TimeDelta::MAX),
            updates,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Notification>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn emit(&self, level: Level, message: &str) {
        let created_at = Utc::now();
        let notification = Notification {
            level,
            message: message.to_string(),
            created_at,
            expires_at: created_at.checked_add_signed(self.visible_for).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        tracing::debug!(level = ?level, "notify: {}", message);
        *self.slot() = Some(notification.clone());
        let _ = self.updates.send(notification);
    }

    /// The latest notification, unless it has expired or was dismissed.
    pub fn current(&self) -> Option<Notification> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Option<Notification> {
        self.slot().clone().filter(|n| n.is_visible_at(now))
    }

    pub fn dismiss(&self) {
        *self.slot() = None;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.updates.subscribe()
    }
}
