//! Unified error types for postr.
//!
//! Validation errors never reach the cache. Transport errors are stored on
//! cache entries and handed to views, so every variant is `Clone`.

use crate::validation::ValidationError;

/// Failure talking to the remote collection API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Non-2xx response.
    #[error("HTTP error: {status}")]
    Http { status: u16, message: Option<String> },

    /// The transport's own timeout elapsed.
    #[error("request timeout")]
    Timeout,

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected schema.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl TransportError {
    /// HTTP-like status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Unified error types for the postr client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Local, pre-network input rejection.
    #[error("VALIDATION_ERROR: {0}")]
    Validation(#[from] ValidationError),

    /// Network or non-2xx failure, including malformed payloads.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(#[from] TransportError),

    /// No snapshot was available to roll an optimistic write back to.
    #[error("ROLLBACK_ERROR: no snapshot to restore for {0}")]
    Rollback(String),

    /// Navigable location could not be parsed.
    #[error("INVALID_LOCATION: {0}")]
    InvalidLocation(String),

    /// A submission was refused because the previous one has not settled.
    #[error("MUTATION_IN_FLIGHT: {0}")]
    MutationInFlight(String),

    /// The fetch task for a cache key panicked or could not be started.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// The cache a subscription was attached to has been dropped.
    #[error("CACHE_CLOSED")]
    CacheClosed,
}

impl Error {
    /// Whether this error came from the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
