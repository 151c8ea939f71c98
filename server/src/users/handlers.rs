//! Profile handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use hub_common::PublicProfile;
use tracing::info;
use validator::Validate;

use super::types::{MeResponse, ProfileError, UpdateProfileRequest};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{ProfileUpdate, User};
use crate::permissions::{authorize, Action};

async fn me_response(state: &AppState, user: User) -> Result<MeResponse, ProfileError> {
    let pinned = state.store.user_pinned_resources(&user.id).await?;
    let rsvped = state.store.user_rsvped_events(&user.id).await?;
    Ok(MeResponse::new(user, pinned, rsvped))
}

/// Get the caller's profile.
///
/// `GET /api/me`
#[tracing::instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ProfileError> {
    let user = state
        .store
        .get_user(&auth.id)
        .await?
        .ok_or(ProfileError::NotFound)?;
    Ok(Json(me_response(&state, user).await?))
}

/// Edit the caller's profile.
///
/// `PATCH /api/me`
#[tracing::instrument(skip(state, body))]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<MeResponse>, ProfileError> {
    authorize(&auth, Action::PostContent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ProfileError::Validation(e.to_string()))?;
    if body.is_empty() {
        return Err(ProfileError::Validation("No fields to update".to_string()));
    }

    let user = state
        .store
        .update_profile(
            &auth.id,
            ProfileUpdate {
                name: body.name,
                bio: body.bio,
                avatar_url: body.avatar_url,
            },
        )
        .await?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(me_response(&state, user).await?))
}

/// Public profile of any user; email is never included.
///
/// `GET /api/users/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicProfile>, ProfileError> {
    let user = state
        .store
        .get_user(&id)
        .await?
        .ok_or(ProfileError::NotFound)?;

    Ok(Json(PublicProfile {
        id: user.id,
        name: user.name,
        role: user.role,
        bio: user.bio,
        avatar_url: user.avatar_url,
        can_organize: user.can_organize,
        created_at: user.created_at,
    }))
}
