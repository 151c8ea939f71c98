//! Moderation audit trail.
//!
//! Entries are built here and handed to the `Store` call that performs the
//! mutation, which records them in the same operation.

use serde_json::Value as JsonValue;
use tracing::info;

use crate::db::NewAuditEntry;

/// Build an audit entry.
///
/// `action` is dotted, `<target>.<verb>` (for example `thread.locked`).
pub fn audit_entry(
    actor_id: &str,
    action: &str,
    target_type: &str,
    target_id: impl ToString,
    details: Option<JsonValue>,
) -> NewAuditEntry {
    NewAuditEntry {
        actor_id: actor_id.to_string(),
        action: action.to_string(),
        target_type: target_type.to_string(),
        target_id: target_id.to_string(),
        details,
    }
}

/// Entry for acting on content owned by someone else; `None` when the actor
/// is the owner.
pub fn staff_entry(
    actor_id: &str,
    owner_id: &str,
    action: &str,
    target_type: &str,
    target_id: impl ToString,
    details: Option<JsonValue>,
) -> Option<NewAuditEntry> {
    (actor_id != owner_id)
        .then(|| audit_entry(actor_id, action, target_type, target_id, details))
}

/// Log an entry after the store has committed it.
pub fn log_recorded(entry: Option<&NewAuditEntry>) {
    if let Some(entry) = entry {
        info!(
            actor_id = %entry.actor_id,
            action = %entry.action,
            target_type = %entry.target_type,
            target_id = %entry.target_id,
            "Moderation action recorded"
        );
    }
}
