//! Admin authorization middleware.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::types::AdminError;
use crate::auth::AuthUser;

/// Middleware that requires the caller to be a moderator or admin.
///
/// Runs inside `require_auth`, so the `AuthUser` extension is present.
#[tracing::instrument(skip(request, next))]
pub async fn require_staff(request: Request, next: Next) -> Result<Response, AdminError> {
    let auth = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AdminError::NotStaff)?;

    if !auth.is_staff() {
        warn!(user_id = %auth.id, role = %auth.role, "Non-staff request to admin routes");
        return Err(AdminError::NotStaff);
    }

    Ok(next.run(request).await)
}
