//! HTTP client for the postr API.
//!
//! ### Endpoints
//!
//! - `GET /users?pageNumber=&pageSize=`: one page of users, with pagination
//! - `GET /users/count`: `{ count }`
//! - `GET /users/{id}`: one user
//! - `GET /posts?userId=`: posts owned by a user
//! - `POST /posts`: create from `{ userId, title, body }`
//! - `DELETE /posts/{id}`: 204 on success
//!
//! ### Headers
//!
//! - `X-API-Key` when a key is configured
//! - `Accept: application/json`
//! - the configured User-Agent
//!
//! There is no automatic retry. Timeouts are the reqwest client's.

mod envelope;
pub mod error;

pub use envelope::Pagination;
pub use error::ApiError;

use async_trait::async_trait;
use postr_core::validation::validate_id;
use postr_core::{AppConfig, Error, NewPost, Page, Post, TransportError, User};
use reqwest::{Method, RequestBuilder, header};
use std::time::{Duration, Instant};
use url::Url;

use crate::remote::RemoteCollectionClient;
use error::transport_error;

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "postr/0.1";

/// API key header name.
const API_KEY_HEADER: &str = "X-API-Key";

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL (default: http://localhost:8080).
    pub base_url: String,
    /// Sent as `X-API-Key` when present.
    pub api_key: Option<String>,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: postr/0.1).
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for ApiConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// reqwest-backed [`RemoteCollectionClient`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a new API client with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|_| ApiError::InvalidBaseUrl(config.base_url.clone()))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { http, base_url, api_key: config.api_key.filter(|key| !key.is_empty()) })
    }

    /// Create a new API client from loaded application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(ApiConfig::from(config))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, escaping each segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url).header(header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = envelope::error_message(&bytes);
            tracing::warn!(status = status.as_u16(), message = ?message, "API request failed");
            return Err(TransportError::Http { status: status.as_u16(), message });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RemoteCollectionClient for ApiClient {
    async fn list_users(&self, page: u32, page_size: u32) -> Result<Page<User>, Error> {
        let start = Instant::now();
        tracing::debug!("listing users: page={} page_size={}", page, page_size);

        let builder = self
            .request(Method::GET, self.url(&["users"]))
            .query(&[("pageNumber", page), ("pageSize", page_size)]);
        let bytes = self.send(builder).await?;
        let page = envelope::decode_page::<User>(&bytes)?;

        tracing::debug!(
            "listed {} users (page {}/{}) in {:?}",
            page.items.len(),
            page.current_page,
            page.total_pages,
            start.elapsed()
        );
        Ok(page)
    }

    async fn count_users(&self) -> Result<u64, Error> {
        let bytes = self.send(self.request(Method::GET, self.url(&["users", "count"]))).await?;
        let envelope = envelope::decode::<envelope::Count>(&bytes)?;
        Ok(envelope.data.count)
    }

    async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, Error> {
        validate_id(user_id)?;
        let start = Instant::now();

        let builder = self
            .request(Method::GET, self.url(&["posts"]))
            .query(&[("userId", user_id)]);
        let bytes = self.send(builder).await?;
        let posts = envelope::decode_list::<Post>(&bytes)?.data;

        tracing::debug!("listed {} posts for user {} in {:?}", posts.len(), user_id, start.elapsed());
        Ok(posts)
    }

    async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        validate_id(user_id)?;
        let bytes = self.send(self.request(Method::GET, self.url(&["users", user_id]))).await?;
        Ok(envelope::decode::<User>(&bytes)?.data)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, Error> {
        post.validate()?;
        tracing::debug!("creating post for user {}", post.user_id);

        let builder = self.request(Method::POST, self.url(&["posts"])).json(post);
        let bytes = self.send(builder).await?;
        Ok(envelope::decode::<Post>(&bytes)?.data)
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), Error> {
        validate_id(post_id)?;
        tracing::debug!("deleting post {}", post_id);

        self.send(self.request(Method::DELETE, self.url(&["posts", post_id])))
            .await?;
        Ok(())
    }
}
