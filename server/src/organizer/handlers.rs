//! Organizer request handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::types::{
    ListRequestsQuery, OrganizerError, OrganizerRequestResponse, ReviewRequest,
    SubmitOrganizerRequest,
};
use crate::api::AppState;
use crate::audit::{audit_entry, log_recorded};
use crate::auth::AuthUser;
use crate::db::{NewOrganizerRequest, OrganizerReview};
use crate::permissions::{authorize, Action};

/// Apply for event-organizing rights.
///
/// `POST /api/organizer-requests`
#[tracing::instrument(skip(state, body))]
pub async fn submit_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SubmitOrganizerRequest>,
) -> Result<(StatusCode, Json<OrganizerRequestResponse>), OrganizerError> {
    authorize(&auth, Action::PostContent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| OrganizerError::Validation(e.to_string()))?;

    // Uniqueness of open requests is enforced by the store itself.
    let request = state
        .store
        .create_organizer_request(NewOrganizerRequest {
            user_id: auth.id.clone(),
            organization_type: body.organization_type,
            organization_name: body.organization_name,
            org_role: body.role,
            justification: body.justification,
        })
        .await?;

    info!(request_id = %request.id, user_id = %auth.id, "Organizer request submitted");
    Ok((StatusCode::CREATED, Json(request.into())))
}

/// The caller's own requests, newest first.
///
/// `GET /api/organizer-requests/mine`
#[tracing::instrument(skip(state))]
pub async fn list_my_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<OrganizerRequestResponse>>, OrganizerError> {
    let requests = state.store.user_organizer_requests(&auth.id).await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// All requests, optionally filtered by status. Staff only.
///
/// `GET /api/organizer-requests`
#[tracing::instrument(skip(state))]
pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<OrganizerRequestResponse>>, OrganizerError> {
    authorize(&auth, Action::ReviewOrganizerRequests)?;
    let requests = state.store.list_organizer_requests(query.status).await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Approve or reject a pending request. Approval grants `can_organize`.
///
/// `POST /api/organizer-requests/{id}/review`
#[tracing::instrument(skip(state, body))]
pub async fn review_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<OrganizerRequestResponse>, OrganizerError> {
    authorize(&auth, Action::ReviewOrganizerRequests)?;
    body.validate()
        .map_err(|e| OrganizerError::Validation(e.to_string()))?;

    let pending = state
        .store
        .get_organizer_request(id)
        .await?
        .ok_or(OrganizerError::NotFound)?;

    let notes = body
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let audit = audit_entry(
        &auth.id,
        &format!("organizer_request.{}", body.decision.target_status()),
        "organizer_request",
        id,
        Some(json!({ "applicant_id": pending.user_id, "notes": notes })),
    );
    let request = state
        .store
        .review_organizer_request(
            id,
            OrganizerReview {
                decision: body.decision,
                reviewer_id: auth.id.clone(),
                notes,
            },
            Some(&audit),
        )
        .await?;
    log_recorded(Some(&audit));

    Ok(Json(request.into()))
}
