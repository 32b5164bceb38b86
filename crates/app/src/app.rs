//! Application context.

use std::sync::Arc;

use postr_client::{ApiClient, RemoteCollectionClient};
use postr_core::{AppConfig, CollectionCache};

use crate::error::AppError;
use crate::location::{Location, Navigator};
use crate::mutations::{CreatePostFlow, DeletePostFlow};
use crate::notifications::Notifier;

/// Everything a view or flow needs, passed explicitly.
///
/// Cloning shares the same cache, client, history and notifier.
#[derive(Clone)]
pub struct App {
    pub cache: CollectionCache,
    pub remote: Arc<dyn RemoteCollectionClient>,
    pub navigator: Navigator,
    pub notifier: Notifier,
    pub page_size: u32,
}

impl App {
    pub fn new(remote: Arc<dyn RemoteCollectionClient>, config: &AppConfig, initial: Location) -> Self {
        Self {
            cache: CollectionCache::with_stale_time(config.stale_time()),
            remote,
            navigator: Navigator::new(initial),
            notifier: Notifier::new(config.notification_duration()),
            page_size: config.page_size,
        }
    }

    /// Build the app around an HTTP client configured from `config`.
    pub fn from_config(config: &AppConfig, initial: Location) -> Result<Self, AppError> {
        let client = ApiClient::from_config(config)?;
        tracing::debug!("using API at {}", client.base_url());
        Ok(Self::new(Arc::new(client), config, initial))
    }

    pub fn create_post_flow(&self) -> CreatePostFlow {
        CreatePostFlow::new(self.cache.clone(), Arc::clone(&self.remote), self.notifier.clone())
    }

    pub fn delete_post_flow(&self) -> DeletePostFlow {
        DeletePostFlow::new(self.cache.clone(), Arc::clone(&self.remote), self.notifier.clone())
    }
}
