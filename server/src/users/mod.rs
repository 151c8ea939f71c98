//! User Profiles

pub mod handlers;
pub mod types;

use axum::routing::get;
use axum::Router;

use crate::api::AppState;

pub use types::ProfileError;

/// Profile routes. Mounted behind `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(handlers::get_me).patch(handlers::update_me))
        .route("/api/users/{id}", get(handlers::get_user))
}
