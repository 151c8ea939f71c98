//! Campus Events
//!
//! Public listings; publishing is limited to staff and approved organizers.

pub mod handlers;
pub mod types;

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::api::AppState;

pub use types::EventsError;

/// Read-only routes, no authentication.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/{id}", get(handlers::get_event))
}

/// Write routes. Mounted behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", post(handlers::create_event))
        .route(
            "/api/events/{id}",
            patch(handlers::update_event).delete(handlers::delete_event),
        )
        .route(
            "/api/events/{id}/rsvp",
            put(handlers::rsvp).delete(handlers::cancel_rsvp),
        )
}
