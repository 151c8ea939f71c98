//! Admin module types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{StoreError, User};
use crate::permissions::PermissionError;

/// Admin API error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Caller is neither moderator nor admin.
    #[error("Moderator or admin privileges required")]
    NotStaff,

    /// Target user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Permission error.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Storage error.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound("user") => Self::UserNotFound,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotStaff => error_response(StatusCode::FORBIDDEN, "NOT_STAFF", self.to_string()),
            Self::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "USER_NOT_FOUND", self.to_string())
            }
            Self::Validation(message) => validation_failed(message),
            Self::Permission(err) => permission_denied(err),
            Self::Store(err) => store_failure(err),
        }
    }
}

// Request types
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetStatusRequest {
    pub status: AccountStatus,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// User row for staff listings.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub can_organize: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            can_organize: user.can_organize,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_status_reason_is_rejected() {
        let request = SetStatusRequest {
            status: AccountStatus::Suspended,
            reason: Some("x".repeat(501)),
        };
        assert!(request.validate().is_err());

        let request = SetStatusRequest {
            status: AccountStatus::Suspended,
            reason: Some("Repeated spam in the marketplace forum".into()),
        };
        assert!(request.validate().is_ok());
    }
}
