//! Remote collection client for postr.
//!
//! This crate provides the [`RemoteCollectionClient`] seam used by the views
//! and mutation flows, and [`ApiClient`], its HTTP implementation.

pub mod api;
pub mod remote;

pub use api::{ApiClient, ApiConfig, ApiError, Pagination};
pub use remote::RemoteCollectionClient;
