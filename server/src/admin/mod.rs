//! Staff Administration
//!
//! User listing, role and account-status management, and the audit log.
//! Every route requires a moderator or admin; role assignment is admin-only.

pub mod handlers;
pub mod middleware;
pub mod types;

use axum::{
    middleware::from_fn,
    routing::{get, put},
    Router,
};

use crate::api::AppState;

pub use middleware::require_staff;
pub use types::AdminError;

/// Create the admin router. Nested under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/{id}/role", put(handlers::set_user_role))
        .route("/users/{id}/status", put(handlers::set_user_status))
        .route("/audit-log", get(handlers::get_audit_log))
        .layer(from_fn(require_staff))
}
