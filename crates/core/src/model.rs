//! Domain models shared by the client and the views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, validate_id, validate_post};

/// A user record as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Single-line address in display order: street, state, city, zipcode.
    pub fn address_line(&self) -> String {
        format!("{}, {}, {}, {}", self.street, self.state, self.city, self.zipcode)
    }
}

/// A post owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(default, rename = "createdAt", alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), title: title.into(), body: body.into() }
    }

    /// Validate the owner id, title and body.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post(&self.title, &self.body)?;
        validate_id(&self.user_id)
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_size: u64,
}

impl<T> Page<T> {
    /// Build a page; `current_page` and `total_pages` are raised to at least 1.
    pub fn new(items: Vec<T>, current_page: u32, total_pages: u32, total_size: u64) -> Self {
        Self { items, current_page: current_page.max(1), total_pages: total_pages.max(1), total_size }
    }

    /// The server echoed a page beyond the last one.
    pub fn is_out_of_range(&self) -> bool {
        self.current_page > self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
