//! Resource Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{Resource, StoreError};
use crate::permissions::PermissionError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResourcesError {
    #[error("Resource not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ResourcesError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ResourcesError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound => {
                error_response(StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND", self.to_string())
            }
            Self::Validation(message) => validation_failed(message),
            Self::Permission(err) => permission_denied(err),
            Self::Store(err) => store_failure(err),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Accept only absolute `http` and `https` links with a host.
pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::new("http_url"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("http_url"));
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::new("http_url"))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::new("http_url"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(
        length(max = 2048, message = "URL must be at most 2048 characters"),
        custom(function = "validate_http_url", message = "URL must be an http(s) link")
    )]
    pub url: String,
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 tags"))]
    pub tags: Vec<String>,
}

impl CreateResourceRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            url: self.url.trim().to_string(),
            category: self.category.trim().to_lowercase(),
            tags: self.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListResourcesQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub uploader_id: String,
    pub pin_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            url: r.url,
            category: r.category,
            tags: r.tags,
            uploader_id: r.uploader_id,
            pin_count: r.pin_count,
            created_at: r.created_at,
        }
    }
}

/// Result of a pin or unpin.
#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub pinned: bool,
    #[serde(flatten)]
    pub resource: ResourceResponse,
}
