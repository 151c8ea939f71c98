//! Database Models
//!
//! Storage records shared by every `Store` backend. Counters such as upvotes,
//! reply counts and attendance are never stored; they are derived from the
//! membership data carried on each record.

use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, OrganizerRequestStatus, ReviewDecision, Role};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identity provider subject.
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Granted by an approved organizer request.
    pub can_organize: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields used to provision a user on first sign-in.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Self-service profile edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Forum thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub locked: bool,
    /// Users who upvoted, in upvote order.
    pub upvoted_by: Vec<String>,
    /// Number of replies at read time.
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Thread {
    /// Upvote count, always equal to the size of `upvoted_by`.
    #[must_use]
    pub fn upvotes(&self) -> i64 {
        self.upvoted_by.len() as i64
    }
}

#[derive(Debug, Clone)]
pub struct NewThread {
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    pub tags: Vec<String>,
}

/// Content edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ThreadEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Moderation flags. `None` leaves a flag unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadFlags {
    pub pinned: Option<bool>,
    pub locked: Option<bool>,
}

/// Thread listing filter.
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
    pub tag: Option<String>,
    /// Case-insensitive substring over title and body.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Reply to a forum thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reply {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    pub upvoted_by: Vec<String>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reply {
    #[must_use]
    pub fn upvotes(&self) -> i64 {
        self.upvoted_by.len() as i64
    }
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub thread_id: Uuid,
    pub body: String,
    pub author_id: String,
    pub author_name: String,
    /// Staff may still reply to a locked thread.
    pub allow_locked: bool,
}

/// Campus event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub category: String,
    /// Maximum attendees; `None` is unlimited.
    pub capacity: Option<i32>,
    pub organizer_id: String,
    /// Users with an RSVP, in RSVP order.
    pub rsvps: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Attendance, always equal to the size of `rsvps`.
    #[must_use]
    pub fn attendees(&self) -> i64 {
        self.rsvps.len() as i64
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.attendees() >= i64::from(cap))
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub capacity: Option<i32>,
    pub organizer_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct EventEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub capacity: Option<i32>,
}

/// Event listing filter.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub category: Option<String>,
    /// Events starting before this instant are skipped; `None` lists all.
    pub starts_after: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// Shared study resource.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub uploader_id: String,
    /// Number of users who pinned the resource.
    pub pin_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub uploader_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub category: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Application for event-organizing rights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerRequest {
    pub id: Uuid,
    pub user_id: String,
    pub organization_type: String,
    pub organization_name: String,
    /// Applicant's position within the organization.
    pub org_role: String,
    pub justification: String,
    pub status: OrganizerRequestStatus,
    pub reviewed_by: Option<String>,
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewOrganizerRequest {
    pub user_id: String,
    pub organization_type: String,
    pub organization_name: String,
    pub org_role: String,
    pub justification: String,
}

/// Reviewer verdict on a pending organizer request.
#[derive(Debug, Clone)]
pub struct OrganizerReview {
    pub decision: ReviewDecision,
    pub reviewer_id: String,
    pub notes: Option<String>,
}

/// Moderation/administration audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: Option<serde_json::Value>,
}

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
