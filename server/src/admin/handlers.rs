//! Admin API handlers.
//!
//! All routes sit behind `require_staff`; per-action rules (admin-only role
//! assignment, the moderator/student hierarchy) are checked in each handler.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use hub_common::AccountStatus;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::types::{AdminError, SetRoleRequest, SetStatusRequest, UserSummary};
use crate::api::{AppState, Paginated, PaginationParams};
use crate::audit::{audit_entry, log_recorded};
use crate::auth::AuthUser;
use crate::db::{AuditEntry, User};
use crate::permissions::{authorize, can_manage_user, Action};

async fn load_target(state: &AppState, id: &str) -> Result<User, AdminError> {
    state
        .store
        .get_user(id)
        .await?
        .ok_or(AdminError::UserNotFound)
}

/// List users, oldest account first.
///
/// `GET /api/admin/users`
#[tracing::instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<UserSummary>>, AdminError> {
    authorize(&auth, Action::ViewUsers)?;
    let (limit, offset) = params.resolve(&state.config);

    let page = state.store.list_users(limit, offset).await?;
    Ok(Json(Paginated {
        items: page.items.into_iter().map(UserSummary::from).collect(),
        total: page.total,
        limit,
        offset,
    }))
}

/// Change a user's role. Admin only.
///
/// `PUT /api/admin/users/{id}/role`
#[tracing::instrument(skip(state))]
pub async fn set_user_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UserSummary>, AdminError> {
    let target = load_target(&state, &id).await?;
    can_manage_user(&auth, Action::AssignRoles, &target.id, target.role)?;

    if target.role == body.role {
        return Ok(Json(target.into()));
    }

    let audit = audit_entry(
        &auth.id,
        "user.role_changed",
        "user",
        &id,
        Some(json!({ "from": target.role, "to": body.role })),
    );
    let updated = state
        .store
        .set_user_role(&id, body.role, Some(&audit))
        .await?;
    log_recorded(Some(&audit));

    info!(actor_id = %auth.id, target_id = %id, from = %target.role, to = %updated.role, "Role changed");
    Ok(Json(updated.into()))
}

/// Suspend, ban or reinstate a user.
///
/// `PUT /api/admin/users/{id}/status`
#[tracing::instrument(skip(state, body))]
pub async fn set_user_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<UserSummary>, AdminError> {
    let target = load_target(&state, &id).await?;
    can_manage_user(&auth, Action::SetUserStatus, &target.id, target.role)?;
    body.validate()
        .map_err(|e| AdminError::Validation(e.to_string()))?;

    if target.status == body.status {
        return Ok(Json(target.into()));
    }

    let verb = match body.status {
        AccountStatus::Active => "reinstated",
        AccountStatus::Suspended => "suspended",
        AccountStatus::Banned => "banned",
    };
    let reason = body
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let audit = audit_entry(
        &auth.id,
        &format!("user.{verb}"),
        "user",
        &id,
        Some(json!({
            "from": target.status,
            "to": body.status,
            "reason": reason,
        })),
    );
    let updated = state
        .store
        .set_user_status(&id, body.status, Some(&audit))
        .await?;
    log_recorded(Some(&audit));

    info!(actor_id = %auth.id, target_id = %id, status = %updated.status, "Account status changed");
    Ok(Json(updated.into()))
}

/// Moderation audit log, newest first.
///
/// `GET /api/admin/audit-log`
#[tracing::instrument(skip(state))]
pub async fn get_audit_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<AuditEntry>>, AdminError> {
    authorize(&auth, Action::ViewAuditLog)?;
    let (limit, offset) = params.resolve(&state.config);

    let page = state.store.list_audit(limit, offset).await?;
    Ok(Json(Paginated {
        items: page.items,
        total: page.total,
        limit,
        offset,
    }))
}
