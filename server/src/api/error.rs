//! Shared error response helpers.
//!
//! Every module error renders the same `{ "error": CODE, "message": text }`
//! body; these helpers cover the cases all modules share.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::ErrorResponse;
use crate::db::StoreError;
use crate::permissions::PermissionError;

/// Render an error body.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

/// 403 for a denied permission check.
pub fn permission_denied(err: &PermissionError) -> Response {
    error_response(StatusCode::FORBIDDEN, err.code(), err.to_string())
}

/// Response for store failures a module does not map itself.
///
/// Backend failures are logged; an unreachable store is 503, anything else
/// the module did not anticipate is 500.
pub fn store_failure(err: &StoreError) -> Response {
    if err.is_backend_failure() {
        tracing::error!(error = %err, "Store failure");
    }
    match err {
        StoreError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
        }
        StoreError::Conflict(conflict) => {
            error_response(StatusCode::CONFLICT, "CONFLICT", conflict.to_string())
        }
        StoreError::Unavailable(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Storage is temporarily unavailable",
        ),
        StoreError::Corrupt(_) | StoreError::Database(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        ),
    }
}

/// 400 for a failed `validator` check.
pub fn validation_failed(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}
