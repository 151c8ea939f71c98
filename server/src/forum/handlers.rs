//! Forum thread and reply handlers.

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
    normalize_tags, CreateThreadRequest, ForumError, ListThreadsQuery, LockThreadRequest,
    PinThreadRequest, ReplyRequest, ReplyResponse, ThreadDetailResponse, ThreadResponse,
    UpdateThreadRequest,
};
use crate::api::{AppState, PaginationParams, Paginated};
use crate::audit::{audit_entry, log_recorded, staff_entry};
use crate::auth::AuthUser;
use crate::db::{NewReply, NewThread, Reply, Thread, ThreadEdit, ThreadFlags, ThreadQuery};
use crate::permissions::{authorize, authorize_owner_or_moderator, Action};

async fn load_thread(state: &AppState, id: Uuid) -> Result<Thread, ForumError> {
    state
        .store
        .get_thread(id)
        .await?
        .ok_or(ForumError::ThreadNotFound)
}

async fn load_reply(state: &AppState, thread_id: Uuid, reply_id: Uuid) -> Result<Reply, ForumError> {
    state
        .store
        .get_reply(thread_id, reply_id)
        .await?
        .ok_or(ForumError::ReplyNotFound)
}

// ============================================================================
// Threads
// ============================================================================

/// List threads, pinned first.
///
/// `GET /api/forum/threads`
#[tracing::instrument(skip(state))]
pub async fn list_threads(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListThreadsQuery>,
) -> Result<Json<Paginated<ThreadResponse>>, ForumError> {
    let (limit, offset) = PaginationParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(&state.config);

    let page = state
        .store
        .list_threads(ThreadQuery {
            tag: query
                .tag
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            limit,
            offset,
        })
        .await?;

    Ok(Json(Paginated {
        items: page
            .items
            .into_iter()
            .map(|t| ThreadResponse::for_viewer(t, &auth.id))
            .collect(),
        total: page.total,
        limit,
        offset,
    }))
}

/// Start a thread.
///
/// `POST /api/forum/threads`
#[tracing::instrument(skip(state, body))]
pub async fn create_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>), ForumError> {
    authorize(&auth, Action::PostContent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ForumError::Validation(e.to_string()))?;

    let thread = state
        .store
        .create_thread(NewThread {
            title: body.title,
            body: body.body,
            author_id: auth.id.clone(),
            author_name: auth.name.clone(),
            tags: normalize_tags(body.tags)?,
        })
        .await?;

    info!(thread_id = %thread.id, author_id = %auth.id, "Thread created");
    Ok((
        StatusCode::CREATED,
        Json(ThreadResponse::for_viewer(thread, &auth.id)),
    ))
}

/// Get a thread with its replies.
///
/// `GET /api/forum/threads/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadDetailResponse>, ForumError> {
    let thread = load_thread(&state, id).await?;
    let replies = state.store.list_replies(id).await?;

    Ok(Json(ThreadDetailResponse {
        thread: ThreadResponse::for_viewer(thread, &auth.id),
        replies: replies
            .into_iter()
            .map(|r| ReplyResponse::for_viewer(r, &auth.id))
            .collect(),
    }))
}

/// Edit a thread. Authors cannot edit a locked thread; staff can.
///
/// `PATCH /api/forum/threads/{id}`
#[tracing::instrument(skip(state, body))]
pub async fn update_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateThreadRequest>,
) -> Result<Json<ThreadResponse>, ForumError> {
    let thread = load_thread(&state, id).await?;
    authorize_owner_or_moderator(&auth, &thread.author_id)?;
    if thread.locked && !auth.is_staff() {
        return Err(ForumError::ThreadLocked);
    }
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ForumError::Validation(e.to_string()))?;

    let tags = body.tags.map(normalize_tags).transpose()?;
    let audit = staff_entry(
        &auth.id,
        &thread.author_id,
        "thread.edited",
        "thread",
        id,
        Some(json!({ "author_id": thread.author_id })),
    );
    let updated = state
        .store
        .update_thread(
            id,
            ThreadEdit {
                title: body.title,
                body: body.body,
                tags,
            },
            audit.as_ref(),
        )
        .await?;
    log_recorded(audit.as_ref());

    Ok(Json(ThreadResponse::for_viewer(updated, &auth.id)))
}

/// Delete a thread with its replies.
///
/// `DELETE /api/forum/threads/{id}`
#[tracing::instrument(skip(state))]
pub async fn delete_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ForumError> {
    let thread = load_thread(&state, id).await?;
    authorize_owner_or_moderator(&auth, &thread.author_id)?;

    let audit = staff_entry(
        &auth.id,
        &thread.author_id,
        "thread.deleted",
        "thread",
        id,
        Some(json!({ "author_id": thread.author_id, "title": thread.title })),
    );
    state.store.delete_thread(id, audit.as_ref()).await?;
    log_recorded(audit.as_ref());

    info!(thread_id = %id, actor_id = %auth.id, "Thread deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Pin or unpin a thread.
///
/// `PUT /api/forum/threads/{id}/pin`
#[tracing::instrument(skip(state))]
pub async fn set_pinned(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PinThreadRequest>,
) -> Result<Json<ThreadResponse>, ForumError> {
    authorize(&auth, Action::ModerateContent)?;

    let action = if body.pinned {
        "thread.pinned"
    } else {
        "thread.unpinned"
    };
    let audit = audit_entry(&auth.id, action, "thread", id, None);
    let thread = state
        .store
        .set_thread_flags(
            id,
            ThreadFlags {
                pinned: Some(body.pinned),
                locked: None,
            },
            Some(&audit),
        )
        .await?;
    log_recorded(Some(&audit));

    Ok(Json(ThreadResponse::for_viewer(thread, &auth.id)))
}

/// Lock or unlock a thread.
///
/// `PUT /api/forum/threads/{id}/lock`
#[tracing::instrument(skip(state))]
pub async fn set_locked(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<LockThreadRequest>,
) -> Result<Json<ThreadResponse>, ForumError> {
    authorize(&auth, Action::ModerateContent)?;

    let action = if body.locked {
        "thread.locked"
    } else {
        "thread.unlocked"
    };
    let audit = audit_entry(&auth.id, action, "thread", id, None);
    let thread = state
        .store
        .set_thread_flags(
            id,
            ThreadFlags {
                pinned: None,
                locked: Some(body.locked),
            },
            Some(&audit),
        )
        .await?;
    log_recorded(Some(&audit));

    Ok(Json(ThreadResponse::for_viewer(thread, &auth.id)))
}

/// Toggle the caller's upvote.
///
/// `POST /api/forum/threads/{id}/upvote`
#[tracing::instrument(skip(state))]
pub async fn toggle_thread_upvote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadResponse>, ForumError> {
    authorize(&auth, Action::PostContent)?;
    let thread = state.store.toggle_thread_upvote(id, &auth.id).await?;
    Ok(Json(ThreadResponse::for_viewer(thread, &auth.id)))
}

// ============================================================================
// Replies
// ============================================================================

/// `GET /api/forum/threads/{id}/replies`
#[tracing::instrument(skip(state))]
pub async fn list_replies(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReplyResponse>>, ForumError> {
    let replies = state.store.list_replies(id).await?;
    Ok(Json(
        replies
            .into_iter()
            .map(|r| ReplyResponse::for_viewer(r, &auth.id))
            .collect(),
    ))
}

/// Reply to a thread. Locked threads only accept replies from staff.
///
/// `POST /api/forum/threads/{id}/replies`
#[tracing::instrument(skip(state, body))]
pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>), ForumError> {
    authorize(&auth, Action::PostContent)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ForumError::Validation(e.to_string()))?;

    // The lock is checked by the store under the thread's row lock.
    let reply = state
        .store
        .create_reply(NewReply {
            thread_id: id,
            body: body.body,
            author_id: auth.id.clone(),
            author_name: auth.name.clone(),
            allow_locked: auth.is_staff(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReplyResponse::for_viewer(reply, &auth.id)),
    ))
}

/// `PATCH /api/forum/threads/{id}/replies/{reply_id}`
#[tracing::instrument(skip(state, body))]
pub async fn update_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, reply_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ForumError> {
    let reply = load_reply(&state, id, reply_id).await?;
    authorize_owner_or_moderator(&auth, &reply.author_id)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ForumError::Validation(e.to_string()))?;

    let audit = staff_entry(
        &auth.id,
        &reply.author_id,
        "reply.edited",
        "reply",
        reply_id,
        Some(json!({ "thread_id": id, "author_id": reply.author_id })),
    );
    let updated = state
        .store
        .update_reply(id, reply_id, body.body, audit.as_ref())
        .await?;
    log_recorded(audit.as_ref());

    Ok(Json(ReplyResponse::for_viewer(updated, &auth.id)))
}

/// `DELETE /api/forum/threads/{id}/replies/{reply_id}`
#[tracing::instrument(skip(state))]
pub async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, reply_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ForumError> {
    let reply = load_reply(&state, id, reply_id).await?;
    authorize_owner_or_moderator(&auth, &reply.author_id)?;

    let audit = staff_entry(
        &auth.id,
        &reply.author_id,
        "reply.deleted",
        "reply",
        reply_id,
        Some(json!({ "thread_id": id, "author_id": reply.author_id })),
    );
    state
        .store
        .delete_reply(id, reply_id, audit.as_ref())
        .await?;
    log_recorded(audit.as_ref());

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/forum/threads/{id}/replies/{reply_id}/upvote`
#[tracing::instrument(skip(state))]
pub async fn toggle_reply_upvote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, reply_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReplyResponse>, ForumError> {
    authorize(&auth, Action::PostContent)?;
    let reply = state
        .store
        .toggle_reply_upvote(id, reply_id, &auth.id)
        .await?;
    Ok(Json(ReplyResponse::for_viewer(reply, &auth.id)))
}
