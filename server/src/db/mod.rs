//! Database Layer
//!
//! The `Store` trait is the single persistence port. Two backends implement it:
//! - [`MemoryStore`]: one lock over all tables, used for development and tests
//! - [`PgStore`]: `PostgreSQL` via sqlx, multi-row invariants in transactions
//!
//! Every operation that touches more than one record (upvote toggles, RSVP
//! capacity, organizer request uniqueness, cascading deletes) is a single
//! `Store` call so each backend can make it atomic. Staff mutations take the
//! audit entry that describes them and record it in the same operation; if
//! the entry cannot be written, the mutation does not happen.

mod memory;
mod models;
mod postgres;


use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, OrganizerRequestStatus, Role};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

/// Invariant violations reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("a pending or approved organizer request already exists")]
    DuplicateOrganizerRequest,
    #[error("organizer request has already been reviewed")]
    AlreadyReviewed,
    #[error("event is at capacity")]
    EventFull,
    #[error("event has already started")]
    EventStarted,
    #[error("capacity is below current attendance")]
    CapacityBelowAttendance,
    #[error("thread is locked")]
    ThreadLocked,
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write would break an invariant.
    #[error("conflict: {0}")]
    Conflict(Conflict),

    /// The backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Database error.
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the error means the backend itself failed.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Corrupt(_) | Self::Database(_)
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for every Campus Hub collection.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    /// Insert the user if absent; an existing record is returned unchanged.
    async fn provision_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<User>;
    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Page<User>>;
    async fn set_user_role(
        &self,
        id: &str,
        role: Role,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User>;
    async fn set_user_status(
        &self,
        id: &str,
        status: AccountStatus,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User>;
    async fn user_pinned_resources(&self, id: &str) -> StoreResult<Vec<Uuid>>;
    async fn user_rsvped_events(&self, id: &str) -> StoreResult<Vec<Uuid>>;

    // Forum threads
    async fn create_thread(&self, thread: NewThread) -> StoreResult<Thread>;
    /// Pinned threads first, then by most recent activity.
    async fn list_threads(&self, query: ThreadQuery) -> StoreResult<Page<Thread>>;
    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>>;
    async fn update_thread(
        &self,
        id: Uuid,
        edit: ThreadEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread>;
    async fn set_thread_flags(
        &self,
        id: Uuid,
        flags: ThreadFlags,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread>;
    /// Removes the thread with its replies and upvotes.
    async fn delete_thread(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()>;
    /// Adds `user_id` to the upvoters, or removes it if already present.
    async fn toggle_thread_upvote(&self, id: Uuid, user_id: &str) -> StoreResult<Thread>;

    // Forum replies
    /// Also bumps the thread's `last_activity_at`. Fails with
    /// [`Conflict::ThreadLocked`] on a locked thread unless `allow_locked`.
    async fn create_reply(&self, reply: NewReply) -> StoreResult<Reply>;
    /// Oldest first.
    async fn list_replies(&self, thread_id: Uuid) -> StoreResult<Vec<Reply>>;
    async fn get_reply(&self, thread_id: Uuid, reply_id: Uuid) -> StoreResult<Option<Reply>>;
    /// Replaces the body and marks the reply edited.
    async fn update_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        body: String,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Reply>;
    async fn delete_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<()>;
    async fn toggle_reply_upvote(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        user_id: &str,
    ) -> StoreResult<Reply>;

    // Events
    async fn create_event(&self, event: NewEvent) -> StoreResult<Event>;
    /// Soonest first.
    async fn list_events(&self, query: EventQuery) -> StoreResult<Page<Event>>;
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;
    async fn update_event(
        &self,
        id: Uuid,
        edit: EventEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Event>;
    /// Removes the event with its RSVPs.
    async fn delete_event(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()>;
    /// Idempotent for existing attendees; enforces capacity and start time atomically.
    async fn add_rsvp(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> StoreResult<Event>;
    /// Idempotent.
    async fn remove_rsvp(&self, id: Uuid, user_id: &str) -> StoreResult<Event>;

    // Resources
    async fn create_resource(&self, resource: NewResource) -> StoreResult<Resource>;
    /// Newest first.
    async fn list_resources(&self, query: ResourceQuery) -> StoreResult<Page<Resource>>;
    async fn get_resource(&self, id: Uuid) -> StoreResult<Option<Resource>>;
    /// Removes the resource with its pins.
    async fn delete_resource(&self, id: Uuid, audit: Option<&NewAuditEntry>)
        -> StoreResult<()>;
    async fn pin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource>;
    async fn unpin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource>;

    // Organizer requests
    /// Fails with [`Conflict::DuplicateOrganizerRequest`] while the user has a
    /// pending or approved request.
    async fn create_organizer_request(
        &self,
        request: NewOrganizerRequest,
    ) -> StoreResult<OrganizerRequest>;
    /// Newest first.
    async fn list_organizer_requests(
        &self,
        status: Option<OrganizerRequestStatus>,
    ) -> StoreResult<Vec<OrganizerRequest>>;
    async fn user_organizer_requests(&self, user_id: &str) -> StoreResult<Vec<OrganizerRequest>>;
    async fn get_organizer_request(&self, id: Uuid) -> StoreResult<Option<OrganizerRequest>>;
    /// Moves a pending request to its final state; approval grants the
    /// applicant `can_organize` in the same operation.
    async fn review_organizer_request(
        &self,
        id: Uuid,
        review: OrganizerReview,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<OrganizerRequest>;

    // Audit log
    /// Newest first.
    async fn list_audit(&self, limit: i64, offset: i64) -> StoreResult<Page<AuditEntry>>;
}

/// Create `PostgreSQL` connection pool with health configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(2)
        .max_connections(20)
        // Prevent hanging requests on pool exhaustion
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Build the store selected by configuration.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn Store>> {
    match database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
