//! In-memory store.
//!
//! All tables sit behind a single `RwLock`; every mutation holds the write
//! guard for its whole read-check-write sequence, which makes each `Store`
//! call atomic with respect to every other. Audit entries are appended under
//! the same guard as the mutation they describe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AccountStatus, OrganizerRequestStatus, ReviewDecision, Role};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    AuditEntry, Event, EventEdit, EventQuery, NewAuditEntry, NewEvent, NewOrganizerRequest,
    NewReply, NewResource, NewThread, NewUser, OrganizerRequest, OrganizerReview, Page,
    ProfileUpdate, Reply, Resource, ResourceQuery, Thread, ThreadEdit, ThreadFlags, ThreadQuery,
    User,
};
use super::{Conflict, Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct ResourceRow {
    resource: Resource,
    pinned_by: Vec<String>,
}

impl ResourceRow {
    fn view(&self) -> Resource {
        let mut resource = self.resource.clone();
        resource.pin_count = self.pinned_by.len() as i64;
        resource
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    threads: HashMap<Uuid, Thread>,
    replies: HashMap<Uuid, Reply>,
    events: HashMap<Uuid, Event>,
    resources: HashMap<Uuid, ResourceRow>,
    organizer_requests: HashMap<Uuid, OrganizerRequest>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn thread_view(&self, thread: &Thread) -> Thread {
        let mut view = thread.clone();
        view.reply_count = self
            .replies
            .values()
            .filter(|r| r.thread_id == thread.id)
            .count() as i64;
        view
    }

    fn thread(&self, id: Uuid) -> StoreResult<Thread> {
        self.threads
            .get(&id)
            .map(|t| self.thread_view(t))
            .ok_or(StoreError::NotFound("thread"))
    }

    fn reply_mut(&mut self, thread_id: Uuid, reply_id: Uuid) -> StoreResult<&mut Reply> {
        self.replies
            .get_mut(&reply_id)
            .filter(|r| r.thread_id == thread_id)
            .ok_or(StoreError::NotFound("reply"))
    }

    fn user_mut(&mut self, id: &str) -> StoreResult<&mut User> {
        self.users.get_mut(id).ok_or(StoreError::NotFound("user"))
    }

    fn append_audit(&mut self, entry: Option<&NewAuditEntry>) {
        if let Some(entry) = entry {
            self.audit.push(AuditEntry {
                id: Uuid::now_v7(),
                actor_id: entry.actor_id.clone(),
                action: entry.action.clone(),
                target_type: entry.target_type.clone(),
                target_id: entry.target_id.clone(),
                details: entry.details.clone(),
                created_at: Utc::now(),
            });
        }
    }
}

/// Toggle `user_id` in an ordered membership list.
fn toggle_member(members: &mut Vec<String>, user_id: &str) {
    if let Some(pos) = members.iter().position(|m| m == user_id) {
        members.remove(pos);
    } else {
        members.push(user_id.to_string());
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    Page { items, total }
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    audit_offline: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage: while set, every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Simulate an audit log outage: while set, every mutation that carries
    /// an audit entry fails with [`StoreError::Unavailable`] and changes nothing.
    pub fn set_audit_offline(&self, offline: bool) {
        self.audit_offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }

    /// Checked before a mutation so a failed audit write leaves state untouched.
    fn ensure_audit_writable(&self, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        self.ensure_online()?;
        if audit.is_some() && self.audit_offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("audit log is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.ensure_online()
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.ensure_online()?;
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn provision_user(&self, user: NewUser) -> StoreResult<User> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let record = tables.users.entry(user.id.clone()).or_insert_with(|| User {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: AccountStatus::Active,
            bio: None,
            avatar_url: None,
            can_organize: false,
            created_at: now,
            updated_at: now,
        });
        Ok(record.clone())
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<User> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Page<User>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(users, limit, offset))
    }

    async fn set_user_role(
        &self,
        id: &str,
        role: Role,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.role = role;
        user.updated_at = Utc::now();
        let updated = user.clone();
        tables.append_audit(audit);
        Ok(updated)
    }

    async fn set_user_status(
        &self,
        id: &str,
        status: AccountStatus,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<User> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.status = status;
        user.updated_at = Utc::now();
        let updated = user.clone();
        tables.append_audit(audit);
        Ok(updated)
    }

    async fn user_pinned_resources(&self, id: &str) -> StoreResult<Vec<Uuid>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut ids: Vec<Uuid> = tables
            .resources
            .values()
            .filter(|row| row.pinned_by.iter().any(|u| u == id))
            .map(|row| row.resource.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn user_rsvped_events(&self, id: &str) -> StoreResult<Vec<Uuid>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut ids: Vec<Uuid> = tables
            .events
            .values()
            .filter(|e| e.rsvps.iter().any(|u| u == id))
            .map(|e| e.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn create_thread(&self, thread: NewThread) -> StoreResult<Thread> {
        self.ensure_online()?;
        let now = Utc::now();
        let record = Thread {
            id: Uuid::now_v7(),
            title: thread.title,
            body: thread.body,
            author_id: thread.author_id,
            author_name: thread.author_name,
            tags: thread.tags,
            pinned: false,
            locked: false,
            upvoted_by: Vec::new(),
            reply_count: 0,
            created_at: now,
            updated_at: now,
            last_activity_at: now,
        };
        self.tables
            .write()
            .await
            .threads
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_threads(&self, query: ThreadQuery) -> StoreResult<Page<Thread>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut threads: Vec<Thread> = tables
            .threads
            .values()
            .filter(|t| {
                query
                    .tag
                    .as_deref()
                    .is_none_or(|tag| t.tags.iter().any(|x| x == tag))
            })
            .filter(|t| {
                needle.as_deref().is_none_or(|n| {
                    t.title.to_lowercase().contains(n) || t.body.to_lowercase().contains(n)
                })
            })
            .map(|t| tables.thread_view(t))
            .collect();
        threads.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.last_activity_at.cmp(&a.last_activity_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(paginate(threads, query.limit, query.offset))
    }

    async fn get_thread(&self, id: Uuid) -> StoreResult<Option<Thread>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        Ok(tables.threads.get(&id).map(|t| tables.thread_view(t)))
    }

    async fn update_thread(
        &self,
        id: Uuid,
        edit: ThreadEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let thread = tables
            .threads
            .get_mut(&id)
            .ok_or(StoreError::NotFound("thread"))?;
        if let Some(title) = edit.title {
            thread.title = title;
        }
        if let Some(body) = edit.body {
            thread.body = body;
        }
        if let Some(tags) = edit.tags {
            thread.tags = tags;
        }
        thread.updated_at = Utc::now();
        tables.append_audit(audit);
        tables.thread(id)
    }

    async fn set_thread_flags(
        &self,
        id: Uuid,
        flags: ThreadFlags,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Thread> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let thread = tables
            .threads
            .get_mut(&id)
            .ok_or(StoreError::NotFound("thread"))?;
        if let Some(pinned) = flags.pinned {
            thread.pinned = pinned;
        }
        if let Some(locked) = flags.locked {
            thread.locked = locked;
        }
        thread.updated_at = Utc::now();
        tables.append_audit(audit);
        tables.thread(id)
    }

    async fn delete_thread(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        tables
            .threads
            .remove(&id)
            .ok_or(StoreError::NotFound("thread"))?;
        tables.replies.retain(|_, r| r.thread_id != id);
        tables.append_audit(audit);
        Ok(())
    }

    async fn toggle_thread_upvote(&self, id: Uuid, user_id: &str) -> StoreResult<Thread> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let thread = tables
            .threads
            .get_mut(&id)
            .ok_or(StoreError::NotFound("thread"))?;
        toggle_member(&mut thread.upvoted_by, user_id);
        tables.thread(id)
    }

    async fn create_reply(&self, reply: NewReply) -> StoreResult<Reply> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let thread = tables
            .threads
            .get_mut(&reply.thread_id)
            .ok_or(StoreError::NotFound("thread"))?;
        if thread.locked && !reply.allow_locked {
            return Err(StoreError::Conflict(Conflict::ThreadLocked));
        }
        thread.last_activity_at = now;
        let record = Reply {
            id: Uuid::now_v7(),
            thread_id: reply.thread_id,
            body: reply.body,
            author_id: reply.author_id,
            author_name: reply.author_name,
            upvoted_by: Vec::new(),
            edited: false,
            created_at: now,
            updated_at: now,
        };
        tables.replies.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_replies(&self, thread_id: Uuid) -> StoreResult<Vec<Reply>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        if !tables.threads.contains_key(&thread_id) {
            return Err(StoreError::NotFound("thread"));
        }
        let mut replies: Vec<Reply> = tables
            .replies
            .values()
            .filter(|r| r.thread_id == thread_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(replies)
    }

    async fn get_reply(&self, thread_id: Uuid, reply_id: Uuid) -> StoreResult<Option<Reply>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .replies
            .get(&reply_id)
            .filter(|r| r.thread_id == thread_id)
            .cloned())
    }

    async fn update_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        body: String,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Reply> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let reply = tables.reply_mut(thread_id, reply_id)?;
        reply.body = body;
        reply.edited = true;
        reply.updated_at = Utc::now();
        let updated = reply.clone();
        tables.append_audit(audit);
        Ok(updated)
    }

    async fn delete_reply(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<()> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        tables.reply_mut(thread_id, reply_id)?;
        tables.replies.remove(&reply_id);
        tables.append_audit(audit);
        Ok(())
    }

    async fn toggle_reply_upvote(
        &self,
        thread_id: Uuid,
        reply_id: Uuid,
        user_id: &str,
    ) -> StoreResult<Reply> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let reply = tables.reply_mut(thread_id, reply_id)?;
        toggle_member(&mut reply.upvoted_by, user_id);
        Ok(reply.clone())
    }

    async fn create_event(&self, event: NewEvent) -> StoreResult<Event> {
        self.ensure_online()?;
        let now = Utc::now();
        let record = Event {
            id: Uuid::now_v7(),
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            location: event.location,
            category: event.category,
            capacity: event.capacity,
            organizer_id: event.organizer_id,
            rsvps: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .events
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_events(&self, query: EventQuery) -> StoreResult<Page<Event>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| query.starts_after.is_none_or(|after| e.starts_at >= after))
            .filter(|e| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| e.category.eq_ignore_ascii_case(c))
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        Ok(paginate(events, query.limit, query.offset))
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        self.ensure_online()?;
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn update_event(
        &self,
        id: Uuid,
        edit: EventEdit,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<Event> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .ok_or(StoreError::NotFound("event"))?;
        if let Some(capacity) = edit.capacity {
            if i64::from(capacity) < event.attendees() {
                return Err(StoreError::Conflict(Conflict::CapacityBelowAttendance));
            }
            event.capacity = Some(capacity);
        }
        if let Some(title) = edit.title {
            event.title = title;
        }
        if let Some(description) = edit.description {
            event.description = description;
        }
        if let Some(starts_at) = edit.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(location) = edit.location {
            event.location = location;
        }
        if let Some(category) = edit.category {
            event.category = category;
        }
        event.updated_at = Utc::now();
        let updated = event.clone();
        tables.append_audit(audit);
        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        tables
            .events
            .remove(&id)
            .ok_or(StoreError::NotFound("event"))?;
        tables.append_audit(audit);
        Ok(())
    }

    async fn add_rsvp(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> StoreResult<Event> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .ok_or(StoreError::NotFound("event"))?;
        if event.rsvps.iter().any(|u| u == user_id) {
            return Ok(event.clone());
        }
        if event.starts_at <= now {
            return Err(StoreError::Conflict(Conflict::EventStarted));
        }
        if event.is_full() {
            return Err(StoreError::Conflict(Conflict::EventFull));
        }
        event.rsvps.push(user_id.to_string());
        Ok(event.clone())
    }

    async fn remove_rsvp(&self, id: Uuid, user_id: &str) -> StoreResult<Event> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .ok_or(StoreError::NotFound("event"))?;
        event.rsvps.retain(|u| u != user_id);
        Ok(event.clone())
    }

    async fn create_resource(&self, resource: NewResource) -> StoreResult<Resource> {
        self.ensure_online()?;
        let row = ResourceRow {
            resource: Resource {
                id: Uuid::now_v7(),
                title: resource.title,
                description: resource.description,
                url: resource.url,
                category: resource.category,
                tags: resource.tags,
                uploader_id: resource.uploader_id,
                pin_count: 0,
                created_at: Utc::now(),
            },
            pinned_by: Vec::new(),
        };
        let view = row.view();
        self.tables.write().await.resources.insert(view.id, row);
        Ok(view)
    }

    async fn list_resources(&self, query: ResourceQuery) -> StoreResult<Page<Resource>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut resources: Vec<Resource> = tables
            .resources
            .values()
            .filter(|row| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| row.resource.category.eq_ignore_ascii_case(c))
            })
            .map(ResourceRow::view)
            .collect();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(resources, query.limit, query.offset))
    }

    async fn get_resource(&self, id: Uuid) -> StoreResult<Option<Resource>> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .await
            .resources
            .get(&id)
            .map(ResourceRow::view))
    }

    async fn delete_resource(&self, id: Uuid, audit: Option<&NewAuditEntry>) -> StoreResult<()> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        tables
            .resources
            .remove(&id)
            .ok_or(StoreError::NotFound("resource"))?;
        tables.append_audit(audit);
        Ok(())
    }

    async fn pin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let row = tables
            .resources
            .get_mut(&id)
            .ok_or(StoreError::NotFound("resource"))?;
        if !row.pinned_by.iter().any(|u| u == user_id) {
            row.pinned_by.push(user_id.to_string());
        }
        Ok(row.view())
    }

    async fn unpin_resource(&self, id: Uuid, user_id: &str) -> StoreResult<Resource> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let row = tables
            .resources
            .get_mut(&id)
            .ok_or(StoreError::NotFound("resource"))?;
        row.pinned_by.retain(|u| u != user_id);
        Ok(row.view())
    }

    async fn create_organizer_request(
        &self,
        request: NewOrganizerRequest,
    ) -> StoreResult<OrganizerRequest> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let blocked = tables
            .organizer_requests
            .values()
            .any(|r| r.user_id == request.user_id && r.status.blocks_resubmission());
        if blocked {
            return Err(StoreError::Conflict(Conflict::DuplicateOrganizerRequest));
        }
        let record = OrganizerRequest {
            id: Uuid::now_v7(),
            user_id: request.user_id,
            organization_type: request.organization_type,
            organization_name: request.organization_name,
            org_role: request.org_role,
            justification: request.justification,
            status: OrganizerRequestStatus::Pending,
            reviewed_by: None,
            reviewer_notes: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        tables.organizer_requests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_organizer_requests(
        &self,
        status: Option<OrganizerRequestStatus>,
    ) -> StoreResult<Vec<OrganizerRequest>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut requests: Vec<OrganizerRequest> = tables
            .organizer_requests
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn user_organizer_requests(&self, user_id: &str) -> StoreResult<Vec<OrganizerRequest>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let mut requests: Vec<OrganizerRequest> = tables
            .organizer_requests
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn get_organizer_request(&self, id: Uuid) -> StoreResult<Option<OrganizerRequest>> {
        self.ensure_online()?;
        Ok(self.tables.read().await.organizer_requests.get(&id).cloned())
    }

    async fn review_organizer_request(
        &self,
        id: Uuid,
        review: OrganizerReview,
        audit: Option<&NewAuditEntry>,
    ) -> StoreResult<OrganizerRequest> {
        self.ensure_audit_writable(audit)?;
        let mut tables = self.tables.write().await;
        let request = tables
            .organizer_requests
            .get_mut(&id)
            .ok_or(StoreError::NotFound("organizer request"))?;
        if request.status != OrganizerRequestStatus::Pending {
            return Err(StoreError::Conflict(Conflict::AlreadyReviewed));
        }
        let now = Utc::now();
        request.status = review.decision.target_status();
        request.reviewed_by = Some(review.reviewer_id);
        request.reviewer_notes = review.notes;
        request.reviewed_at = Some(now);
        let updated = request.clone();

        if review.decision == ReviewDecision::Approve {
            if let Some(user) = tables.users.get_mut(&updated.user_id) {
                user.can_organize = true;
                user.updated_at = now;
            }
        }
        tables.append_audit(audit);
        Ok(updated)
    }

    async fn list_audit(&self, limit: i64, offset: i64) -> StoreResult<Page<AuditEntry>> {
        self.ensure_online()?;
        let tables = self.tables.read().await;
        let entries: Vec<AuditEntry> = tables.audit.iter().rev().cloned().collect();
        Ok(paginate(entries, limit, offset))
    }
}
