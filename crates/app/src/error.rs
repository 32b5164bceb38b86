//! Structured errors for the postr app.

use postr_client::ApiError;
use postr_core::{ConfigError, Error};

/// Shown for failures the user cannot act on.
pub const FALLBACK_MESSAGE: &str = "Failed to fetch data. Please try again later";

/// Errors raised while assembling the app.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("CLIENT_ERROR: {0}")]
    Client(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] Error),
}

/// Message a view shows for `err`.
///
/// Transport failures collapse to [`FALLBACK_MESSAGE`]; local input errors
/// are shown as-is.
pub fn display_message(err: &Error) -> String {
    match err {
        Error::Validation(validation) => validation.to_string(),
        _ => FALLBACK_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postr_core::{TransportError, ValidationError};

    #[test]
    fn test_transport_errors_use_fallback() {
        let err = Error::Transport(TransportError::Http { status: 500, message: Some("db down".into()) });
        assert_eq!(display_message(&err), FALLBACK_MESSAGE);
        assert_eq!(display_message(&Error::Transport(TransportError::Timeout)), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_validation_errors_shown_verbatim() {
        let err = Error::Validation(ValidationError::InvalidId("abc".into()));
        assert!(display_message(&err).contains("abc"));
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(ConfigError::Invalid { field: "page_size".into(), reason: "must be 1-100".into() });
        assert!(err.to_string().starts_with("CONFIG_ERROR"));
    }
}
