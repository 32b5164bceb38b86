//! Runtime settings for the postr client.
//!
//! Sources, lowest to highest precedence: built-in defaults, the TOML file
//! named by `POSTR_CONFIG_FILE`, then `POSTR_*` environment variables.
//! Nested keys use `__` in variable names.

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Settings shared by the API client, the cache and the views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the users/posts API.
    ///
    /// Set via POSTR_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value sent in the `X-API-Key` header.
    ///
    /// Set via POSTR_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via POSTR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via POSTR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Users listed per page.
    ///
    /// Set via POSTR_PAGE_SIZE environment variable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Age after which cached data is refetched on the next query.
    ///
    /// Set via POSTR_STALE_TIME_MS environment variable. Zero means every
    /// query revalidates while still showing the cached data.
    #[serde(default)]
    pub stale_time_ms: u64,

    /// How long a notification stays visible.
    ///
    /// Set via POSTR_NOTIFICATION_MS environment variable.
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "postr/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_page_size() -> u32 {
    4
}

fn default_notification_ms() -> u64 {
    1_500
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            stale_time_ms: 0,
            notification_ms: default_notification_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    /// Merge defaults, the optional TOML file and `POSTR_*` variables, then validate.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadFailed` when a source cannot be read or parsed,
    /// `ConfigError::Invalid` when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("POSTR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("POSTR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
