//! Actions gated by the authorization layer.

use hub_common::Role;

/// Something a caller may try to do.
///
/// Each action names the weakest caller allowed to perform it; see
/// [`Action::permits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create threads, replies and resources, upvote, RSVP, apply as organizer,
    /// and edit or delete one's own content
    PostContent,
    /// Pin or lock threads and edit or delete other users' content
    ModerateContent,
    /// Publish events
    CreateEvent,
    /// Approve or reject organizer requests
    ReviewOrganizerRequests,
    /// List user accounts
    ViewUsers,
    /// Suspend, ban or reinstate users
    SetUserStatus,
    /// Change user roles
    AssignRoles,
    /// Read the moderation audit log
    ViewAuditLog,
}

impl Action {
    /// Returns the action name for audit logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use hub_server::permissions::Action;
    ///
    /// assert_eq!(Action::SetUserStatus.action_name(), "set_user_status");
    /// ```
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::PostContent => "post_content",
            Self::ModerateContent => "moderate_content",
            Self::CreateEvent => "create_event",
            Self::ReviewOrganizerRequests => "review_organizer_requests",
            Self::ViewUsers => "view_users",
            Self::SetUserStatus => "set_user_status",
            Self::AssignRoles => "assign_roles",
            Self::ViewAuditLog => "view_audit_log",
        }
    }

    /// Returns all actions as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PostContent,
            Self::ModerateContent,
            Self::CreateEvent,
            Self::ReviewOrganizerRequests,
            Self::ViewUsers,
            Self::SetUserStatus,
            Self::AssignRoles,
            Self::ViewAuditLog,
        ]
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::PostContent => "Post and manage your own content",
            Self::ModerateContent => "Moderate other users' content",
            Self::CreateEvent => "Publish campus events",
            Self::ReviewOrganizerRequests => "Review organizer requests",
            Self::ViewUsers => "View user accounts",
            Self::SetUserStatus => "Suspend, ban or reinstate users",
            Self::AssignRoles => "Assign user roles",
            Self::ViewAuditLog => "View the moderation audit log",
        }
    }

    /// Whether the action changes state. Suspended accounts may only perform
    /// read actions.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        !matches!(self, Self::ViewUsers | Self::ViewAuditLog)
    }

    /// Whether `role` (plus the organizer grant) is enough for this action.
    #[must_use]
    pub const fn permits(&self, role: Role, can_organize: bool) -> bool {
        match self {
            Self::PostContent => true,
            Self::CreateEvent => can_organize || role.is_staff(),
            Self::AssignRoles => matches!(role, Role::Admin),
            Self::ModerateContent
            | Self::ReviewOrganizerRequests
            | Self::ViewUsers
            | Self::SetUserStatus
            | Self::ViewAuditLog => role.is_staff(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_snake_case() {
        for action in Action::all() {
            let name = action.action_name();
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "Action name '{name}' should be snake_case"
            );
        }
    }

    #[test]
    fn test_action_names_are_unique() {
        let names: Vec<&str> = Action::all().iter().map(|a| a.action_name()).collect();
        for (i, name) in names.iter().enumerate() {
            assert!(
                !names[i + 1..].contains(name),
                "Duplicate action name found: {name}"
            );
        }
    }

    #[test]
    fn test_serde_matches_action_name() {
        for action in Action::all() {
            let json = serde_json::to_string(action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.action_name()));
        }
    }

    #[test]
    fn test_students_only_post() {
        let allowed: Vec<Action> = Action::all()
            .iter()
            .copied()
            .filter(|a| a.permits(Role::Student, false))
            .collect();
        assert_eq!(allowed, vec![Action::PostContent]);
    }

    #[test]
    fn test_organizer_grant_allows_events() {
        assert!(Action::CreateEvent.permits(Role::Student, true));
        assert!(!Action::ModerateContent.permits(Role::Student, true));
    }

    #[test]
    fn test_moderators_cannot_assign_roles() {
        for action in Action::all() {
            let expected = *action != Action::AssignRoles;
            assert_eq!(action.permits(Role::Moderator, false), expected, "{action}");
        }
    }

    #[test]
    fn test_admins_can_do_everything() {
        assert!(Action::all().iter().all(|a| a.permits(Role::Admin, false)));
    }

    #[test]
    fn test_only_views_are_reads() {
        let reads: Vec<Action> = Action::all()
            .iter()
            .copied()
            .filter(|a| !a.is_write())
            .collect();
        assert_eq!(reads, vec![Action::ViewUsers, Action::ViewAuditLog]);
    }
}
