//! Organizer Request Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use hub_common::{OrganizerRequestStatus, ReviewDecision};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{Conflict, OrganizerRequest, StoreError};
use crate::permissions::PermissionError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrganizerError {
    #[error("Organizer request not found")]
    NotFound,
    #[error("You already have a pending or approved organizer request")]
    Duplicate,
    #[error("Organizer request has already been reviewed")]
    AlreadyReviewed,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OrganizerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Conflict(Conflict::DuplicateOrganizerRequest) => Self::Duplicate,
            StoreError::Conflict(Conflict::AlreadyReviewed) => Self::AlreadyReviewed,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for OrganizerError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound => {
                error_response(StatusCode::NOT_FOUND, "REQUEST_NOT_FOUND", self.to_string())
            }
            Self::Duplicate => {
                error_response(StatusCode::CONFLICT, "DUPLICATE_REQUEST", self.to_string())
            }
            Self::AlreadyReviewed => {
                error_response(StatusCode::CONFLICT, "ALREADY_REVIEWED", self.to_string())
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

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitOrganizerRequest {
    #[validate(length(min = 1, max = 120, message = "Organization type must be 1-120 characters"))]
    pub organization_type: String,
    #[validate(length(min = 1, max = 120, message = "Organization name must be 1-120 characters"))]
    pub organization_name: String,
    /// Applicant's position within the organization.
    #[validate(length(min = 1, max = 80, message = "Role must be 1-80 characters"))]
    pub role: String,
    #[validate(length(
        min = 20,
        max = 2000,
        message = "Justification must be 20-2000 characters"
    ))]
    pub justification: String,
}

impl SubmitOrganizerRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            organization_type: self.organization_type.trim().to_string(),
            organization_name: self.organization_name.trim().to_string(),
            role: self.role.trim().to_string(),
            justification: self.justification.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<OrganizerRequestStatus>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OrganizerRequestResponse {
    pub id: Uuid,
    pub user_id: String,
    pub organization_type: String,
    pub organization_name: String,
    pub role: String,
    pub justification: String,
    pub status: OrganizerRequestStatus,
    pub reviewed_by: Option<String>,
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<OrganizerRequest> for OrganizerRequestResponse {
    fn from(r: OrganizerRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            organization_type: r.organization_type,
            organization_name: r.organization_name,
            role: r.org_role,
            justification: r.justification,
            status: r.status,
            reviewed_by: r.reviewed_by,
            reviewer_notes: r.reviewer_notes,
            created_at: r.created_at,
            reviewed_at: r.reviewed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(justification: &str) -> SubmitOrganizerRequest {
        SubmitOrganizerRequest {
            organization_type: " Student club ".into(),
            organization_name: "Chess Club".into(),
            role: "President".into(),
            justification: justification.into(),
        }
    }

    #[test]
    fn short_justification_fails_validation() {
        assert!(submission("too short").trimmed().validate().is_err());
    }

    #[test]
    fn padding_does_not_count_towards_length() {
        let padded = format!("{}short", " ".repeat(30));
        assert!(submission(&padded).trimmed().validate().is_err());
    }

    #[test]
    fn valid_submission_passes() {
        let request = submission("We host weekly tournaments open to everyone.").trimmed();
        assert!(request.validate().is_ok());
        assert_eq!(request.organization_type, "Student club");
    }
}
