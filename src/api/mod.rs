//! Boundary to the user service.
//!
//! [`UserApi`] is the only way the core talks to the server. [`HttpUserApi`]
//! speaks the REST contract; [`InMemoryUserApi`] implements the same server
//! rules in memory for tests and the demo mode.

#[cfg(feature = "http")]
mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ListPage, ListQuery, User, UserId, UserPayload};

#[cfg(feature = "http")]
pub use http::HttpUserApi;
pub use memory::InMemoryUserApi;

/// Error codes emitted by the user service.
pub mod codes {
    pub const DUPLICATE: &str = "duplicate";
    pub const VALIDATION: &str = "validation_error";
    pub const NOT_FOUND: &str = "not_found";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// `{ error: <code>, details: [{ field, message }] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default)]
    pub details: Vec<FieldIssue>,
}

impl ErrorPayload {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            error: code.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.details.push(FieldIssue::new(field, message));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("server rejected the request ({status}): {}", .payload.error)]
    Rejected { status: u16, payload: ErrorPayload },
    #[error("could not reach the server: {0}")]
    Transport(String),
    #[error("unexpected response from the server: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(status: u16, payload: ErrorPayload) -> Self {
        ApiError::Rejected { status, payload }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Rejected { status, payload } => {
                *status == 404 || payload.error == codes::NOT_FOUND
            }
            _ => false,
        }
    }
}

/// Query string of a list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort: String,
}

impl From<&ListQuery> for ListRequest {
    fn from(query: &ListQuery) -> Self {
        let text = query.text.trim();
        Self {
            enabled: query.enabled,
            q: (!text.is_empty()).then(|| text.to_string()),
            page: query.page,
            page_size: query.page_size.get(),
            sort: query.sort.to_string(),
        }
    }
}

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError>;
    async fn get(&self, id: &UserId) -> Result<User, ApiError>;
    async fn create(&self, payload: &UserPayload) -> Result<User, ApiError>;
    async fn update(&self, id: &UserId, payload: &UserPayload) -> Result<User, ApiError>;
}
