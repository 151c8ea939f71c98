//! `PostgreSQL` store.
//!
//! Runtime queries (no compile-time `DATABASE_URL` required). Operations that
//! touch several rows run in one transaction and lock the parent row with
//! `SELECT ... FOR UPDATE`. An audit entry is inserted in the transaction of
//! the mutation it describes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, OrganizerRequestStatus, ReviewDecision, Role};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::error;
use uuid::Uuid;

use super::models::{
    AuditEntry, Event, EventEdit, EventQuery, NewAuditEntry, NewEvent, NewOrganizerRequest,
    NewReply, NewResource, NewThread, NewUser, OrganizerRequest, OrganizerReview, Page,
    ProfileUpdate, Reply, Resource, ResourceQuery, Thread, ThreadEdit, ThreadFlags, ThreadQuery,
    User,
};
use super::{Conflict, Store, StoreError, StoreResult};

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr) => {
        |e: sqlx::Error| {
            error!(query = $query, error = %e, "Database query failed");
            StoreError::from(e)
        }
    };
}

const THREAD_SELECT: &str = r"
    SELECT
        t.id, t.title, t.body, t.author_id, t.author_name, t.tags, t.pinned, t.locked,
        COALESCE(
            (SELECT array_agg(u.user_id ORDER BY u.created_at)
             FROM thread_upvotes u WHERE u.thread_id = t.id),
            '{}'::text[]
        ) AS upvoted_by,
        (SELECT COUNT(*) FROM forum_replies r WHERE r.thread_id = t.id) AS reply_count,
        t.created_at, t.updated_at, t.last_activity_at
    FROM forum_threads t
";

const REPLY_SELECT: &str = r"
    SELECT
        r.id, r.thread_id, r.body, r.author_id, r.author_name,
        COALESCE(
            (SELECT array_agg(u.user_id ORDER BY u.created_at)
             FROM reply_upvotes u WHERE u.reply_id = r.id),
            '{}'::text[]
        ) AS upvoted_by,
        r.edited, r.created_at, r.updated_at
    FROM forum_replies r
";

const EVENT_SELECT: &str = r"
    SELECT
        e.id, e.title, e.description, e.starts_at, e.location, e.category, e.capacity,
        e.organizer_id,
        COALESCE(
            (SELECT array_agg(v.user_id ORDER BY v.created_at)
             FROM event_rsvps v WHERE v.event_id = e.id),
            '{}'::text[]
        ) AS rsvps,
        e.created_at, e.updated_at
    FROM events e
";

const RESOURCE_SELECT: &str = r"
    SELECT
        r.id, r.title, r.description, r.url, r.category, r.tags, r.uploader_id,
        (SELECT COUNT(*) FROM resource_pins p WHERE p.resource_id = r.id) AS pin_count,
        r.created_at
    FROM resources r
";

const ORGANIZER_COLUMNS: &str = r"
    id, user_id, organization_type, organization_name, org_role, justification,
    status, reviewed_by, reviewer_notes, created_at, reviewed_at
";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: Option<String>,
    role: String,
    status: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    can_organize: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status: AccountStatus = row
            .status
            .parse()
            .map_err(|e: hub_common::Error| StoreError::Corrupt(e.to_string()))?;
        Ok(Self {
            // Unknown or missing roles fall back to the least privileged role.
            role: row.role.parse().unwrap_or_default(),
            id: row.id,
            name: row.name,
            email: row.email,
            status,
            bio: row.bio,
            avatar_url: row.avatar_url,
            can_organize: row.can_organize,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrganizerRow {
    id: Uuid,
    user_id: String,
    organization_type: String,
    organization_name: String,
    org_role: String,
    justification: String,
    status: String,
    reviewed_by: Option<String>,
    reviewer_notes: Option<String>,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrganizerRow> for OrganizerRequest {
    type Error = StoreError;

    fn try_from(row: OrganizerRow) -> Result<Self, Self::Error> {
        let status: OrganizerRequestStatus = row
            .status
            .parse()
            .map_err(|e: hub_common::Error| StoreError::Corrupt(e.to_string()))?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            organization_type: row.organization_type,
            organization_name: row.organization_name,
            org_role: row.org_role,
            justification: row.justification,
            status,
            reviewed_by: row.reviewed_by,
            reviewer_notes: row.reviewer_notes,
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        })
    }
}

fn users_from_rows(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

fn requests_from_rows(rows: Vec<OrganizerRow>) -> StoreResult<Vec<OrganizerRequest>> {
    rows.into_iter().map(OrganizerRequest::try_from).collect()
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool. Migrations must already have run.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_thread(&self, id: Uuid) -> StoreResult<Option<Thread>> {
        sqlx::query_as::<_, Thread>(&format!("{THREAD_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("fetch_thread"))
    }

    async fn fetch_reply(&self, thread_id: Uuid, reply_id: Uuid) -> StoreResult<Option<Reply>> {
        sqlx::query_as::<_, Reply>(&format!(
            "{REPLY_SELECT} WHERE r.id = $1 AND r.thread_id = $2"
        ))
        .bind(reply_id)
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("fetch_reply"))
    }

    async fn fetch_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        sqlx::query_as::<_, Event>(&format!("{EVENT_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("fetch_event"))
    }

    async fn fetch_resource(&self, id: Uuid) -> StoreResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>(&format!("{RESOURCE_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("fetch_resource"))
    }

    /// Run an `UPDATE users ... RETURNING *` that binds the id and one text value.
    async fn update_user_field(
        &self,
        id: &str,
        sql: &str,
        value: &str,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(id)
            .bind(value)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error!("update_user_field"))?
            .ok_or(StoreError::NotFound("user"))?;
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        row.try_into()
    }

    /// Insert the audit entry, if any, inside the caller's transaction.
    async fn insert_audit(
        tx: &mut Transaction<'_, Postgres>,
        entry: Option<&NewAuditEntry>,
    ) -> StoreResult<()> {
        let Some(entry) = entry else {
            return Ok(());
        };
        sqlx::query(
            r"
            INSERT INTO audit_log (id, actor_id, action, target_type, target_id, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(Uuid::now_v7())
        .bind(&entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(&entry.target_id)
        .bind(&entry.details)
        .execute(&mut **tx)
        .await
        .map_err(db_error!("insert_audit"))?;
        Ok(())
    }

    /// Lock a thread row for the rest of the transaction; returns its `locked` flag.
    async fn lock_thread(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT locked FROM forum_threads WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error!("lock_thread"))?
            .ok_or(StoreError::NotFound("thread"))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error!("ping"))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("get_user"))?
            .map(User::try_from)
            .transpose()
    }

    async fn provision_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error!("provision_user"))?;

        self.get_user(&user.id)
            .await?
            .ok_or(StoreError::NotFound("user"))
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(update.name)
        .bind(update.bio)
        .bind(update.avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("update_profile"))?
        .ok_or(StoreError::NotFound("user"))?
        .try_into()
    }

    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Page<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_users"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error!("count_users"))?;

        Ok(Page {
            items: users_from_rows(rows)?,
            total,
        })
    }

    async fn set_user_role(
        &self,
        id: &str,
        role: Role,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User> {
        self.update_user_field(
            id,
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
            role.as_str(),
            audit,
        )
        .await
    }

    async fn set_user_status(
        &self,
        id: &str,
        status: AccountStatus,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User> {
        self.update_user_field(
            id,
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
            status.as_str(),
            audit,
        )
        .await
    }

    async fn user_pinned_resources(&self, id: &str) -> StoreResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT resource_id FROM resource_pins WHERE user_id = $1 ORDER BY resource_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("user_pinned_resources"))
    }

    async fn user_rsvped_events(&self, id: &str) -> StoreResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM event_rsvps WHERE user_id = $1 ORDER BY event_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("user_rsvped_events"))
    }

    // ------------------------------------------------------------------------
    // Forum threads
    // ------------------------------------------------------------------------

    async fn create_thread(&self, thread: NewThread) -> StoreResult<Thread> {
        let id = Uuid::now_v7();
        sqlx::query(
            r"
            INSERT INTO forum_threads (id, title, body, author_id, author_name, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&thread.title)
        .bind(&thread.body)
        .bind(&thread.author_id)
        .bind(&thread.author_name)
        .bind(&thread.tags)
        .execute(&self.pool)
        .await
        .map_err(db_error!("create_thread"))?;

        self.fetch_thread(id)
            .await?
            .ok_or(StoreError::NotFound("thread"))
    }

    async fn list_threads(&self, query: ThreadQuery) -> StoreResult<Page<Thread>> {
        let pattern = query.search.as_deref().map(like_pattern);
        let filter = r"
            WHERE ($1::text IS NULL OR $1 = ANY(t.tags))
              AND ($2::text IS NULL OR t.title ILIKE $2 OR t.body ILIKE $2)
        ";

        let items = sqlx::query_as::<_, Thread>(&format!(
            "{THREAD_SELECT} {filter}
             ORDER BY t.pinned DESC, t.last_activity_at DESC, t.id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(&query.tag)
        .bind(&pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_threads"))?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM forum_threads t {filter}"))
                .bind(&query.tag)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error!("count_threads"))?;

        Ok(Page { items, total })
    }

    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>> {
        self.fetch_thread(id).await
    }

    async fn update_thread(
        &self,
        id: Uuid,
        edit: ThreadEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query(
            r"
            UPDATE forum_threads
            SET title = COALESCE($2, title),
                body = COALESCE($3, body),
                tags = COALESCE($4, tags),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(edit.title)
        .bind(edit.body)
        .bind(edit.tags)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("update_thread"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("thread"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_thread(id)
            .await?
            .ok_or(StoreError::NotFound("thread"))
    }

    async fn set_thread_flags(
        &self,
        id: Uuid,
        flags: ThreadFlags,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query(
            r"
            UPDATE forum_threads
            SET pinned = COALESCE($2, pinned),
                locked = COALESCE($3, locked),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(flags.pinned)
        .bind(flags.locked)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_thread_flags"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("thread"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_thread(id)
            .await?
            .ok_or(StoreError::NotFound("thread"))
    }

    async fn delete_thread(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        // Replies and upvotes go with the thread via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM forum_threads WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("delete_thread"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("thread"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        Ok(())
    }

    async fn toggle_thread_upvote(&self, id: Uuid, user_id: &str) -> StoreResult<Thread> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        Self::lock_thread(&mut tx, id).await?;

        let removed = sqlx::query("DELETE FROM thread_upvotes WHERE thread_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("remove_thread_upvote"))?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO thread_upvotes (thread_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("add_thread_upvote"))?;
        }
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_thread(id)
            .await?
            .ok_or(StoreError::NotFound("thread"))
    }

    // ------------------------------------------------------------------------
    // Forum replies
    // ------------------------------------------------------------------------

    async fn create_reply(&self, reply: NewReply) -> StoreResult<Reply> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let locked = Self::lock_thread(&mut tx, reply.thread_id).await?;
        if locked && !reply.allow_locked {
            return Err(StoreError::Conflict(Conflict::ThreadLocked));
        }

        sqlx::query(
            r"
            INSERT INTO forum_replies (id, thread_id, body, author_id, author_name)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(reply.thread_id)
        .bind(&reply.body)
        .bind(&reply.author_id)
        .bind(&reply.author_name)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("create_reply"))?;

        sqlx::query("UPDATE forum_threads SET last_activity_at = NOW() WHERE id = $1")
            .bind(reply.thread_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("bump_thread"))?;

        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_reply(reply.thread_id, id)
            .await?
            .ok_or(StoreError::NotFound("reply"))
    }

    async fn list_replies(&self, thread_id: Uuid) -> StoreResult<Vec<Reply>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM forum_threads WHERE id = $1)")
                .bind(thread_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error!("thread_exists"))?;
        if !exists {
            return Err(StoreError::NotFound("thread"));
        }

        sqlx::query_as::<_, Reply>(&format!(
            "{REPLY_SELECT} WHERE r.thread_id = $1 ORDER BY r.created_at ASC, r.id ASC"
        ))
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_replies"))
    }

    async fn get_reply(&self, thread_id: Uuid, reply_id: Uuid) -> StoreResult<Option<Reply>> {
        self.fetch_reply(thread_id, reply_id).await
    }

    async fn update_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        body: String,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Reply> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query(
            r"
            UPDATE forum_replies
            SET body = $3, edited = TRUE, updated_at = NOW()
            WHERE id = $1 AND thread_id = $2
            ",
        )
        .bind(reply_id)
        .bind(thread_id)
        .bind(body)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("update_reply"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("reply"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_reply(thread_id, reply_id)
            .await?
            .ok_or(StoreError::NotFound("reply"))
    }

    async fn delete_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query("DELETE FROM forum_replies WHERE id = $1 AND thread_id = $2")
            .bind(reply_id)
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("delete_reply"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("reply"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        Ok(())
    }

    async fn toggle_reply_upvote(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        user_id: &str,
    ) -> StoreResult<Reply> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM forum_replies WHERE id = $1 AND thread_id = $2 FOR UPDATE",
        )
        .bind(reply_id)
        .bind(thread_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error!("lock_reply"))?
        .ok_or(StoreError::NotFound("reply"))?;

        let removed = sqlx::query("DELETE FROM reply_upvotes WHERE reply_id = $1 AND user_id = $2")
            .bind(reply_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("remove_reply_upvote"))?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO reply_upvotes (reply_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(reply_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("add_reply_upvote"))?;
        }
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_reply(thread_id, reply_id)
            .await?
            .ok_or(StoreError::NotFound("reply"))
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    async fn create_event(&self, event: NewEvent) -> StoreResult<Event> {
        let id = Uuid::now_v7();
        sqlx::query(
            r"
            INSERT INTO events
                (id, title, description, starts_at, location, category, capacity, organizer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.starts_at)
        .bind(&event.location)
        .bind(&event.category)
        .bind(event.capacity)
        .bind(&event.organizer_id)
        .execute(&self.pool)
        .await
        .map_err(db_error!("create_event"))?;

        self.fetch_event(id)
            .await?
            .ok_or(StoreError::NotFound("event"))
    }

    async fn list_events(&self, query: EventQuery) -> StoreResult<Page<Event>> {
        let filter = r"
            WHERE ($1::timestamptz IS NULL OR e.starts_at >= $1)
              AND ($2::text IS NULL OR lower(e.category) = lower($2))
        ";

        let items = sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} {filter} ORDER BY e.starts_at ASC, e.id ASC LIMIT $3 OFFSET $4"
        ))
        .bind(query.starts_after)
        .bind(&query.category)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_events"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events e {filter}"))
            .bind(query.starts_after)
            .bind(&query.category)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error!("count_events"))?;

        Ok(Page { items, total })
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        self.fetch_event(id).await
    }

    async fn update_event(
        &self,
        id: Uuid,
        edit: EventEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error!("lock_event"))?
            .ok_or(StoreError::NotFound("event"))?;

        if let Some(capacity) = edit.capacity {
            let attendees: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_error!("count_rsvps"))?;
            if i64::from(capacity) < attendees {
                return Err(StoreError::Conflict(Conflict::CapacityBelowAttendance));
            }
        }

        sqlx::query(
            r"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                starts_at = COALESCE($4, starts_at),
                location = COALESCE($5, location),
                category = COALESCE($6, category),
                capacity = COALESCE($7, capacity),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(edit.title)
        .bind(edit.description)
        .bind(edit.starts_at)
        .bind(edit.location)
        .bind(edit.category)
        .bind(edit.capacity)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("update_event"))?;

        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_event(id)
            .await?
            .ok_or(StoreError::NotFound("event"))
    }

    async fn delete_event(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("delete_event"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("event"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        Ok(())
    }

    async fn add_rsvp(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;

        let (capacity, starts_at): (Option<i32>, DateTime<Utc>) =
            sqlx::query_as("SELECT capacity, starts_at FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error!("lock_event"))?
                .ok_or(StoreError::NotFound("event"))?;

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM event_rsvps WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error!("rsvp_exists"))?;

        if !already {
            if starts_at <= now {
                return Err(StoreError::Conflict(Conflict::EventStarted));
            }
            if let Some(capacity) = capacity {
                let attendees: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(db_error!("count_rsvps"))?;
                if attendees >= i64::from(capacity) {
                    return Err(StoreError::Conflict(Conflict::EventFull));
                }
            }
            sqlx::query("INSERT INTO event_rsvps (event_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error!("add_rsvp"))?;
        }
        tx.commit().await.map_err(db_error!("commit"))?;

        self.fetch_event(id)
            .await?
            .ok_or(StoreError::NotFound("event"))
    }

    async fn remove_rsvp(&self, id: Uuid, user_id: &str) -> StoreResult<Event> {
        sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error!("remove_rsvp"))?;

        self.fetch_event(id)
            .await?
            .ok_or(StoreError::NotFound("event"))
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    async fn create_resource(&self, resource: NewResource) -> StoreResult<Resource> {
        let id = Uuid::now_v7();
        sqlx::query(
            r"
            INSERT INTO resources (id, title, description, url, category, tags, uploader_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.url)
        .bind(&resource.category)
        .bind(&resource.tags)
        .bind(&resource.uploader_id)
        .execute(&self.pool)
        .await
        .map_err(db_error!("create_resource"))?;

        self.fetch_resource(id)
            .await?
            .ok_or(StoreError::NotFound("resource"))
    }

    async fn list_resources(&self, query: ResourceQuery) -> StoreResult<Page<Resource>> {
        let filter = "WHERE ($1::text IS NULL OR lower(r.category) = lower($1))";

        let items = sqlx::query_as::<_, Resource>(&format!(
            "{RESOURCE_SELECT} {filter} ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(&query.category)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_resources"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM resources r {filter}"))
            .bind(&query.category)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error!("count_resources"))?;

        Ok(Page { items, total })
    }

    async fn get_resource(&self, id: Uuid) -> StoreResult<Option<Resource>> {
        self.fetch_resource(id).await
    }

    async fn delete_resource(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("delete_resource"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("resource"));
        }
        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        Ok(())
    }

    async fn pin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource> {
        sqlx::query(
            r"
            INSERT INTO resource_pins (resource_id, user_id)
            SELECT id, $2 FROM resources WHERE id = $1
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error!("pin_resource"))?;

        // Zero rows inserted means already pinned or no such resource.
        self.fetch_resource(id)
            .await?
            .ok_or(StoreError::NotFound("resource"))
    }

    async fn unpin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource> {
        sqlx::query("DELETE FROM resource_pins WHERE resource_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error!("unpin_resource"))?;

        self.fetch_resource(id)
            .await?
            .ok_or(StoreError::NotFound("resource"))
    }

    // ------------------------------------------------------------------------
    // Organizer requests
    // ------------------------------------------------------------------------

    async fn create_organizer_request(
        &self,
        request: NewOrganizerRequest,
    ) -> StoreResult<OrganizerRequest> {
        // The partial unique index makes concurrent submissions race-free.
        sqlx::query_as::<_, OrganizerRow>(&format!(
            r"
            INSERT INTO organizer_requests
                (id, user_id, organization_type, organization_name, org_role, justification)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORGANIZER_COLUMNS}
            "
        ))
        .bind(Uuid::now_v7())
        .bind(&request.user_id)
        .bind(&request.organization_type)
        .bind(&request.organization_name)
        .bind(&request.org_role)
        .bind(&request.justification)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict(Conflict::DuplicateOrganizerRequest);
                }
            }
            error!(query = "create_organizer_request", error = %e, "Database query failed");
            StoreError::Database(e)
        })?
        .try_into()
    }

    async fn list_organizer_requests(
        &self,
        status: Option<OrganizerRequestStatus>,
    ) -> StoreResult<Vec<OrganizerRequest>> {
        let rows = sqlx::query_as::<_, OrganizerRow>(&format!(
            r"
            SELECT {ORGANIZER_COLUMNS}
            FROM organizer_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_organizer_requests"))?;

        requests_from_rows(rows)
    }

    async fn user_organizer_requests(&self, user_id: &str) -> StoreResult<Vec<OrganizerRequest>> {
        let rows = sqlx::query_as::<_, OrganizerRow>(&format!(
            r"
            SELECT {ORGANIZER_COLUMNS}
            FROM organizer_requests
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("user_organizer_requests"))?;

        requests_from_rows(rows)
    }

    async fn get_organizer_request(&self, id: Uuid) -> StoreResult<Option<OrganizerRequest>> {
        sqlx::query_as::<_, OrganizerRow>(&format!(
            "SELECT {ORGANIZER_COLUMNS} FROM organizer_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("get_organizer_request"))?
        .map(OrganizerRequest::try_from)
        .transpose()
    }

    async fn review_organizer_request(
        &self,
        id: Uuid,
        review: OrganizerReview,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<OrganizerRequest> {
        let mut tx = self.pool.begin().await.map_err(db_error!("begin"))?;

        let status: String =
            sqlx::query_scalar("SELECT status FROM organizer_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error!("lock_organizer_request"))?
                .ok_or(StoreError::NotFound("organizer request"))?;

        if status != OrganizerRequestStatus::Pending.as_str() {
            return Err(StoreError::Conflict(Conflict::AlreadyReviewed));
        }

        let row = sqlx::query_as::<_, OrganizerRow>(&format!(
            r"
            UPDATE organizer_requests
            SET status = $2, reviewed_by = $3, reviewer_notes = $4, reviewed_at = NOW()
            WHERE id = $1
            RETURNING {ORGANIZER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(review.decision.target_status().as_str())
        .bind(&review.reviewer_id)
        .bind(&review.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error!("review_organizer_request"))?;

        if review.decision == ReviewDecision::Approve {
            sqlx::query("UPDATE users SET can_organize = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(&row.user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error!("grant_organizer"))?;
        }

        Self::insert_audit(&mut tx, audit).await?;
        tx.commit().await.map_err(db_error!("commit"))?;
        row.try_into()
    }

    // ------------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------------

    async fn list_audit(&self, limit: i64, offset: i64) -> StoreResult<Page<AuditEntry>> {
        let items = sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT id, actor_id, action, target_type, target_id, details, created_at
            FROM audit_log
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_audit"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error!("count_audit"))?;

        Ok(Page { items, total })
    }
}
