//! Event handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::types::{
    CreateEventRequest, EventResponse, EventsError, ListEventsQuery, UpdateEventRequest,
};
use crate::api::{AppState, PaginationParams, Paginated};
use crate::audit::{log_recorded, staff_entry};
use crate::auth::AuthUser;
use crate::db::{Event, EventEdit, EventQuery, NewEvent};
use crate::permissions::{authorize, authorize_owner_or_moderator, Action};

async fn load_event(state: &AppState, id: Uuid) -> Result<Event, EventsError> {
    state
        .store
        .get_event(id)
        .await?
        .ok_or(EventsError::NotFound)
}

/// List events, soonest first. Past events are hidden unless `include_past`.
///
/// `GET /api/events`
#[tracing::instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Paginated<EventResponse>>, EventsError> {
    let (limit, offset) = PaginationParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(&state.config);

    let page = state
        .store
        .list_events(EventQuery {
            category: query.category.filter(|c| !c.trim().is_empty()),
            starts_after: (!query.include_past).then(Utc::now),
            limit,
            offset,
        })
        .await?;

    Ok(Json(Paginated {
        items: page
            .items
            .into_iter()
            .map(|e| EventResponse::new(e, None))
            .collect(),
        total: page.total,
        limit,
        offset,
    }))
}

/// `GET /api/events/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, EventsError> {
    let event = load_event(&state, id).await?;
    Ok(Json(EventResponse::new(event, None)))
}

/// Publish an event. Requires staff or an approved organizer request.
///
/// `POST /api/events`
#[tracing::instrument(skip(state, body))]
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), EventsError> {
    authorize(&auth, Action::CreateEvent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| EventsError::Validation(e.to_string()))?;
    if body.starts_at <= Utc::now() {
        return Err(EventsError::Validation(
            "Event must start in the future".to_string(),
        ));
    }

    let event = state
        .store
        .create_event(NewEvent {
            title: body.title,
            description: body.description,
            starts_at: body.starts_at,
            location: body.location,
            category: body.category,
            capacity: body.capacity,
            organizer_id: auth.id.clone(),
        })
        .await?;

    info!(event_id = %event.id, organizer_id = %auth.id, "Event created");
    Ok((
        StatusCode::CREATED,
        Json(EventResponse::new(event, Some(&auth.id))),
    ))
}

/// `PATCH /api/events/{id}`
#[tracing::instrument(skip(state, body))]
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, EventsError> {
    let event = load_event(&state, id).await?;
    authorize_owner_or_moderator(&auth, &event.organizer_id)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| EventsError::Validation(e.to_string()))?;

    let audit = staff_entry(
        &auth.id,
        &event.organizer_id,
        "event.edited",
        "event",
        id,
        Some(json!({ "organizer_id": event.organizer_id })),
    );
    let updated = state
        .store
        .update_event(
            id,
            EventEdit {
                title: body.title,
                description: body.description,
                starts_at: body.starts_at,
                location: body.location,
                category: body.category,
                capacity: body.capacity,
            },
            audit.as_ref(),
        )
        .await?;
    log_recorded(audit.as_ref());

    Ok(Json(EventResponse::new(updated, Some(&auth.id))))
}

/// `DELETE /api/events/{id}`
#[tracing::instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, EventsError> {
    let event = load_event(&state, id).await?;
    authorize_owner_or_moderator(&auth, &event.organizer_id)?;

    let audit = staff_entry(
        &auth.id,
        &event.organizer_id,
        "event.deleted",
        "event",
        id,
        Some(json!({ "organizer_id": event.organizer_id, "title": event.title })),
    );
    state.store.delete_event(id, audit.as_ref()).await?;
    log_recorded(audit.as_ref());

    info!(event_id = %id, actor_id = %auth.id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// RSVP to an event. Repeating an RSVP is a no-op.
///
/// `PUT /api/events/{id}/rsvp`
#[tracing::instrument(skip(state))]
pub async fn rsvp(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, EventsError> {
    authorize(&auth, Action::PostContent)?;
    let event = state.store.add_rsvp(id, &auth.id, Utc::now()).await?;
    Ok(Json(EventResponse::new(event, Some(&auth.id))))
}

/// Cancel an RSVP. Cancelling twice is a no-op.
///
/// `DELETE /api/events/{id}/rsvp`
#[tracing::instrument(skip(state))]
pub async fn cancel_rsvp(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, EventsError> {
    authorize(&auth, Action::PostContent)?;
    let event = state.store.remove_rsvp(id, &auth.id).await?;
    Ok(Json(EventResponse::new(event, Some(&auth.id))))
}
