//! Profile Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{StoreError, User};
use crate::permissions::PermissionError;
use crate::resources::types::validate_http_url;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ProfileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound => {
                error_response(StatusCode::NOT_FOUND, "USER_NOT_FOUND", self.to_string())
            }
            Self::Validation(message) => validation_failed(message),
            Self::Permission(err) => permission_denied(err),
            Self::Store(err) => store_failure(err),
        }
    }
}

/// `PATCH /api/me` body. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(
        length(max = 2048, message = "Avatar URL must be at most 2048 characters"),
        custom(function = "validate_http_url", message = "Avatar URL must be an http(s) link")
    )]
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            bio: self.bio.map(|b| b.trim().to_string()),
            avatar_url: self.avatar_url.map(|u| u.trim().to_string()),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

/// The caller's own profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub can_organize: bool,
    pub pinned_resources: Vec<Uuid>,
    pub rsvped_events: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl MeResponse {
    pub fn new(user: User, pinned_resources: Vec<Uuid>, rsvped_events: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            bio: user.bio,
            avatar_url: user.avatar_url,
            can_organize: user.can_organize,
            pinned_resources,
            rsvped_events,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_must_be_a_link() {
        let request = UpdateProfileRequest {
            name: None,
            bio: None,
            avatar_url: Some("javascript:alert(1)".into()),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let request = UpdateProfileRequest {
            name: Some(String::new()),
            bio: Some("Second-year physics".into()),
            avatar_url: None,
        };
        assert!(request.validate().is_err());
        assert!(!request.is_empty());
    }

    #[test]
    fn whitespace_name_is_rejected_after_trimming() {
        let request = UpdateProfileRequest {
            name: Some("    ".into()),
            bio: None,
            avatar_url: None,
        }
        .trimmed();
        assert!(request.validate().is_err());
    }
}
