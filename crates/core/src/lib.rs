//! Core types and shared functionality for postr.
//!
//! This crate provides:
//! - The query-keyed collection cache with optimistic writes
//! - The pagination window algorithm
//! - Domain models and input validation
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pagination;
pub mod validation;

pub use cache::{Change, CollectionCache, KeyPart, QueryEntry, QueryKey, QueryOptions, QueryStatus, Subscription};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, TransportError};
pub use model::{NewPost, Page, Post, User};
pub use pagination::{PageItem, Pager, compute_window};
pub use validation::ValidationError;
