//! Shared resource handlers.

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
    CreateResourceRequest, ListResourcesQuery, PinResponse, ResourceResponse, ResourcesError,
};
use crate::api::{AppState, PaginationParams, Paginated};
use crate::audit::{log_recorded, staff_entry};
use crate::auth::AuthUser;
use crate::db::{NewResource, ResourceQuery};
use crate::permissions::{authorize, authorize_owner_or_moderator, Action};

/// List resources, newest first.
///
/// `GET /api/resources`
#[tracing::instrument(skip(state))]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<Paginated<ResourceResponse>>, ResourcesError> {
    let (limit, offset) = PaginationParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(&state.config);

    let page = state
        .store
        .list_resources(ResourceQuery {
            category: query.category.filter(|c| !c.trim().is_empty()),
            limit,
            offset,
        })
        .await?;

    Ok(Json(Paginated {
        items: page.items.into_iter().map(ResourceResponse::from).collect(),
        total: page.total,
        limit,
        offset,
    }))
}

/// `GET /api/resources/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceResponse>, ResourcesError> {
    let resource = state
        .store
        .get_resource(id)
        .await?
        .ok_or(ResourcesError::NotFound)?;
    Ok(Json(resource.into()))
}

/// Share a resource.
///
/// `POST /api/resources`
#[tracing::instrument(skip(state, body))]
pub async fn create_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), ResourcesError> {
    authorize(&auth, Action::PostContent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ResourcesError::Validation(e.to_string()))?;

    let mut tags: Vec<String> = Vec::new();
    for tag in body.tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let resource = state
        .store
        .create_resource(NewResource {
            title: body.title,
            description: body.description,
            url: body.url,
            category: body.category,
            tags,
            uploader_id: auth.id.clone(),
        })
        .await?;

    info!(resource_id = %resource.id, uploader_id = %auth.id, "Resource shared");
    Ok((StatusCode::CREATED, Json(resource.into())))
}

/// `DELETE /api/resources/{id}`
#[tracing::instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ResourcesError> {
    let resource = state
        .store
        .get_resource(id)
        .await?
        .ok_or(ResourcesError::NotFound)?;
    authorize_owner_or_moderator(&auth, &resource.uploader_id)?;

    let audit = staff_entry(
        &auth.id,
        &resource.uploader_id,
        "resource.deleted",
        "resource",
        id,
        Some(json!({ "uploader_id": resource.uploader_id, "title": resource.title })),
    );
    state.store.delete_resource(id, audit.as_ref()).await?;
    log_recorded(audit.as_ref());

    Ok(StatusCode::NO_CONTENT)
}

/// Add a resource to the caller's pinned set.
///
/// `PUT /api/resources/{id}/pin`
#[tracing::instrument(skip(state))]
pub async fn pin_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PinResponse>, ResourcesError> {
    authorize(&auth, Action::PostContent)?;
    let resource = state.store.pin_resource(id, &auth.id).await?;
    Ok(Json(PinResponse {
        pinned: true,
        resource: resource.into(),
    }))
}

/// `DELETE /api/resources/{id}/pin`
#[tracing::instrument(skip(state))]
pub async fn unpin_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PinResponse>, ResourcesError> {
    authorize(&auth, Action::PostContent)?;
    let resource = state.store.unpin_resource(id, &auth.id).await?;
    Ok(Json(PinResponse {
        pinned: false,
        resource: resource.into(),
    }))
}
