//! Event Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{Conflict, Event, StoreError};
use crate::permissions::PermissionError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    #[error("Event not found")]
    NotFound,
    #[error("Event is at capacity")]
    Full,
    #[error("Event has already started")]
    Started,
    #[error("Capacity cannot be lower than current attendance")]
    CapacityBelowAttendance,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EventsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Conflict(Conflict::EventFull) => Self::Full,
            StoreError::Conflict(Conflict::EventStarted) => Self::Started,
            StoreError::Conflict(Conflict::CapacityBelowAttendance) => {
                Self::CapacityBelowAttendance
            }
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for EventsError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound => {
                error_response(StatusCode::NOT_FOUND, "EVENT_NOT_FOUND", self.to_string())
            }
            Self::Full => error_response(StatusCode::CONFLICT, "EVENT_FULL", self.to_string()),
            Self::Started => {
                error_response(StatusCode::CONFLICT, "EVENT_STARTED", self.to_string())
            }
            Self::CapacityBelowAttendance => error_response(
                StatusCode::CONFLICT,
                "CAPACITY_BELOW_ATTENDANCE",
                self.to_string(),
            ),
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
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: String,
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,
}

impl CreateEventRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            category: self.category.trim().to_lowercase(),
            ..self
        }
    }
}

impl UpdateEventRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            location: self.location.map(|l| l.trim().to_string()),
            category: self.category.map(|c| c.trim().to_lowercase()),
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<String>,
    /// Include events that have already started.
    #[serde(default)]
    pub include_past: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub capacity: Option<i32>,
    pub organizer_id: String,
    pub attendees: i64,
    /// Remaining seats; absent for unlimited events.
    pub spots_left: Option<i64>,
    pub is_full: bool,
    /// Whether the caller has an RSVP; absent on public listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_rsvped: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(event: Event, viewer_id: Option<&str>) -> Self {
        let attendees = event.attendees();
        Self {
            spots_left: event
                .capacity
                .map(|cap| (i64::from(cap) - attendees).max(0)),
            is_full: event.is_full(),
            has_rsvped: viewer_id.map(|v| event.rsvps.iter().any(|u| u == v)),
            attendees,
            id: event.id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            location: event.location,
            category: event.category,
            capacity: event.capacity,
            organizer_id: event.organizer_id,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}
