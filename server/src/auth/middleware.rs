//! Authentication Middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hub_common::{AccountStatus, Role};
use tracing::{info, warn};

use crate::api::AppState;
use crate::db::{NewUser, User};

use super::error::AuthError;
use super::identity::{resolve_identity, Identity};

/// Authenticated user injected into request extensions.
///
/// Carries the role and status read from the store for this request; handlers
/// never trust role information from the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity provider subject.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email (if known).
    pub email: Option<String>,
    /// Role assigned in the store.
    pub role: Role,
    /// Account status.
    pub status: AccountStatus,
    /// Whether an organizer request was approved for this user.
    pub can_organize: bool,
}

impl AuthUser {
    /// Moderator or admin.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            can_organize: user.can_organize,
        }
    }
}

/// Load the user for `identity`, provisioning a record on first sight.
async fn load_or_provision(state: &AppState, identity: Identity) -> Result<User, AuthError> {
    if let Some(user) = state.store.get_user(&identity.subject).await? {
        return Ok(user);
    }

    let role = if state.config.is_bootstrap_admin(&identity.subject) {
        warn!(subject = %identity.subject, "Provisioning bootstrap admin");
        Role::Admin
    } else {
        Role::Student
    };
    let name = identity
        .name
        .clone()
        .or_else(|| identity.email.clone())
        .unwrap_or_else(|| identity.subject.clone());

    let user = state
        .store
        .provision_user(NewUser {
            id: identity.subject,
            name,
            email: identity.email,
            role,
        })
        .await?;
    info!(user_id = %user.id, role = %user.role, "Provisioned user");
    Ok(user)
}

/// Middleware to require authentication.
///
/// Resolves the caller's identity, loads (or provisions) the user record and
/// injects `AuthUser` into request extensions. A failing store denies the
/// request with 503; banned accounts are rejected with 403.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = resolve_identity(request.headers(), &state.config)?;
    let user = load_or_provision(&state, identity).await?;

    if user.status == AccountStatus::Banned {
        warn!(user_id = %user.id, "Rejected request from banned account");
        return Err(AuthError::AccountBanned);
    }

    request.extensions_mut().insert(AuthUser::from(user));
    Ok(next.run(request).await)
}

/// Extractor for authenticated user in handlers.
///
/// Only valid on routes behind [`require_auth`]:
///
/// ```ignore
/// async fn protected_handler(auth_user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", auth_user.name)
/// }
/// ```
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
