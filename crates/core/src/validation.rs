//! Input validation for post submissions and resource identifiers.
//!
//! Runs before any network call; a failure here never touches the cache.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum post title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum post body length in characters.
pub const MAX_BODY_CHARS: usize = 500;

static COMPACT_UUID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").expect("valid regex"));

/// Local validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title too long: {len} chars (max {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("body is required")]
    BodyRequired,

    #[error("body too long: {len} chars (max {max})")]
    BodyTooLong { len: usize, max: usize },

    #[error("invalid id format: {0}")]
    InvalidId(String),
}

/// Validate a post title and body.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_post(title: &str, body: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }

    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong { len, max: MAX_TITLE_CHARS });
    }

    if body.trim().is_empty() {
        return Err(ValidationError::BodyRequired);
    }

    let len = body.chars().count();
    if len > MAX_BODY_CHARS {
        return Err(ValidationError::BodyTooLong { len, max: MAX_BODY_CHARS });
    }

    Ok(())
}

/// Validate a resource identifier (compact UUID, 32 hex characters).
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if COMPACT_UUID.is_match(id) { Ok(()) } else { Err(ValidationError::InvalidId(id.to_string())) }
}
