//! Response envelope decoding.
//!
//! Successful responses are wrapped as `{ status, message, data, pagination? }`.
//! Failures carry `{ status, code, message }`. Decoding is strict: a body that
//! does not match the expected shape is a [`TransportError::Malformed`].

use postr_core::{Page, TransportError};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Success envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_size: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Count {
    pub count: u64,
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, TransportError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|e| TransportError::Malformed(e.to_string()))?;
    if envelope.status == "error" {
        return Err(TransportError::Malformed(format!("error status in success response: {}", envelope.message)));
    }
    Ok(envelope)
}

/// Decode a list; a `null` data field is an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<Vec<T>>, TransportError> {
    let envelope = decode::<Option<Vec<T>>>(bytes)?;
    Ok(Envelope {
        status: envelope.status,
        message: envelope.message,
        data: envelope.data.unwrap_or_default(),
        pagination: envelope.pagination,
    })
}

/// Decode a paginated list. The pagination block is required.
pub(crate) fn decode_page<T: DeserializeOwned>(bytes: &[u8]) -> Result<Page<T>, TransportError> {
    let envelope = decode_list::<T>(bytes)?;
    let pagination =
        envelope.pagination.ok_or_else(|| TransportError::Malformed("missing pagination".to_string()))?;
    Ok(Page::new(envelope.data, pagination.current_page, pagination.total_pages, pagination.total_size))
}

/// Human-readable message from an error body, if it decodes.
pub(crate) fn error_message(bytes: &[u8]) -> Option<String> {
    let body: ErrorBody = serde_json::from_slice(bytes).ok()?;
    match (body.code, body.message) {
        (Some(code), Some(message)) => Some(format!("{code}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(code), None) => Some(code),
        (None, None) => None,
    }
}
