//! Organizer Requests
//!
//! Students apply for event-organizing rights; staff approve or reject.
//! A user holds at most one pending or approved request at a time.

pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;

use crate::api::AppState;

pub use types::OrganizerError;

/// Organizer request routes. Mounted behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/organizer-requests",
            get(handlers::list_requests).post(handlers::submit_request),
        )
        .route(
            "/api/organizer-requests/mine",
            get(handlers::list_my_requests),
        )
        .route(
            "/api/organizer-requests/{id}/review",
            post(handlers::review_request),
        )
}
