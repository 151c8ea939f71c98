//! Forum Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::error::{error_response, permission_denied, store_failure, validation_failed};
use crate::db::{Conflict, Reply, StoreError, Thread};
use crate::permissions::PermissionError;

// ============================================================================
// Constants
// ============================================================================

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 32;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("Thread not found")]
    ThreadNotFound,
    #[error("Reply not found")]
    ReplyNotFound,
    #[error("Thread is locked")]
    ThreadLocked,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ForumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound("thread") => Self::ThreadNotFound,
            StoreError::NotFound("reply") => Self::ReplyNotFound,
            StoreError::Conflict(Conflict::ThreadLocked) => Self::ThreadLocked,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        match &self {
            Self::ThreadNotFound => {
                error_response(StatusCode::NOT_FOUND, "THREAD_NOT_FOUND", self.to_string())
            }
            Self::ReplyNotFound => {
                error_response(StatusCode::NOT_FOUND, "REPLY_NOT_FOUND", self.to_string())
            }
            Self::ThreadLocked => {
                error_response(StatusCode::CONFLICT, "THREAD_LOCKED", self.to_string())
            }
            Self::Validation(message) => validation_failed(message),
            Self::Permission(err) => permission_denied(err),
            Self::Store(err) => store_failure(err),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 10000, message = "Body must be 1-10000 characters"))]
    pub body: String,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateThreadRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000, message = "Body must be 1-10000 characters"))]
    pub body: Option<String>,
    #[validate(length(max = 10, message = "At most 10 tags"))]
    pub tags: Option<Vec<String>>,
}

impl CreateThreadRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            tags: self.tags,
        }
    }
}

impl UpdateThreadRequest {
    /// Trim surrounding whitespace before validation.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            body: self.body.map(|b| b.trim().to_string()),
            tags: self.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PinThreadRequest {
    pub pinned: bool,
}

#[derive(Debug, Deserialize)]
pub struct LockThreadRequest {
    pub locked: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 5000, message = "Reply must be 1-5000 characters"))]
    pub body: String,
}

impl ReplyRequest {
    pub fn trimmed(self) -> Self {
        Self {
            body: self.body.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListThreadsQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Trim, lowercase and de-duplicate tags, dropping empty ones.
pub fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ForumError> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(ForumError::Validation(format!(
                "Tags must be at most {MAX_TAG_LENGTH} characters"
            )));
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    if normalized.len() > MAX_TAGS {
        return Err(ForumError::Validation(format!("At most {MAX_TAGS} tags")));
    }
    Ok(normalized)
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub locked: bool,
    pub upvotes: i64,
    pub upvoted_by: Vec<String>,
    /// Whether the caller is among `upvoted_by`.
    pub has_upvoted: bool,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl ThreadResponse {
    pub fn for_viewer(thread: Thread, viewer_id: &str) -> Self {
        Self {
            upvotes: thread.upvotes(),
            has_upvoted: thread.upvoted_by.iter().any(|u| u == viewer_id),
            id: thread.id,
            title: thread.title,
            body: thread.body,
            author_id: thread.author_id,
            author_name: thread.author_name,
            tags: thread.tags,
            pinned: thread.pinned,
            locked: thread.locked,
            upvoted_by: thread.upvoted_by,
            reply_count: thread.reply_count,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            last_activity_at: thread.last_activity_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    pub upvotes: i64,
    pub upvoted_by: Vec<String>,
    pub has_upvoted: bool,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReplyResponse {
    pub fn for_viewer(reply: Reply, viewer_id: &str) -> Self {
        Self {
            upvotes: reply.upvotes(),
            has_upvoted: reply.upvoted_by.iter().any(|u| u == viewer_id),
            id: reply.id,
            thread_id: reply.thread_id,
            body: reply.body,
            author_id: reply.author_id,
            author_name: reply.author_name,
            upvoted_by: reply.upvoted_by,
            edited: reply.edited,
            created_at: reply.created_at,
            updated_at: reply.updated_at,
        }
    }
}

/// Thread with its replies, oldest first.
#[derive(Debug, Serialize)]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: ThreadResponse,
    pub replies: Vec<ReplyResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags(vec![
            " Math ".into(),
            "math".into(),
            String::new(),
            "Exams".into(),
        ])
        .unwrap();
        assert_eq!(tags, vec!["math", "exams"]);
    }

    #[test]
    fn overlong_tag_is_rejected() {
        let result = normalize_tags(vec!["x".repeat(MAX_TAG_LENGTH + 1)]);
        assert!(matches!(result, Err(ForumError::Validation(_))));
    }

    #[test]
    fn whitespace_title_is_rejected_after_trimming() {
        let request = CreateThreadRequest {
            title: "    ".into(),
            body: "Real question".into(),
            tags: Vec::new(),
        }
        .trimmed();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let edit = UpdateThreadRequest {
            title: Some("\t ".into()),
            body: None,
            tags: None,
        }
        .trimmed();
        assert!(edit.validate().is_err());
    }
}
