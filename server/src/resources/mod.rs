//! Study Resources
//!
//! Shared links with per-user pins.

pub mod handlers;
pub mod types;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::api::AppState;

pub use types::ResourcesError;

/// Read-only routes, no authentication.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/resources", get(handlers::list_resources))
        .route("/api/resources/{id}", get(handlers::get_resource))
}

/// Write routes. Mounted behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/resources", post(handlers::create_resource))
        .route("/api/resources/{id}", delete(handlers::delete_resource))
        .route(
            "/api/resources/{id}/pin",
            put(handlers::pin_resource).delete(handlers::unpin_resource),
        )
}
