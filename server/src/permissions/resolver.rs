//! Permission resolution logic.
//!
//! Every check takes the actor as loaded from the store for the current
//! request and returns `Ok(())` or the reason for denial.

use hub_common::{AccountStatus, Role};

use super::action::Action;
use crate::auth::AuthUser;

/// Check whether `actor` may perform `action`.
///
/// Order:
/// 1. Suspended accounts may only read
/// 2. The actor's role (and organizer grant) must permit the action
pub fn authorize(actor: &AuthUser, action: Action) -> Result<(), PermissionError> {
    if actor.status != AccountStatus::Active && action.is_write() {
        return Err(PermissionError::AccountSuspended);
    }

    if !action.permits(actor.role, actor.can_organize) {
        return Err(PermissionError::NotPermitted(action));
    }

    Ok(())
}

/// Check a mutation of content owned by `owner_id`.
///
/// Owners need only [`Action::PostContent`]; everyone else needs
/// [`Action::ModerateContent`].
pub fn authorize_owner_or_moderator(
    actor: &AuthUser,
    owner_id: &str,
) -> Result<(), PermissionError> {
    if actor.id == owner_id {
        authorize(actor, Action::PostContent)
    } else {
        authorize(actor, Action::ModerateContent)
    }
}

/// Check if `actor` may change the role or status of a user.
///
/// Rules:
/// 1. Must hold `action` ([`Action::SetUserStatus`] or [`Action::AssignRoles`])
/// 2. Cannot change your own role or status
/// 3. Non-admins may only act on users of a lower rank
pub fn can_manage_user(
    actor: &AuthUser,
    action: Action,
    target_id: &str,
    target_role: Role,
) -> Result<(), PermissionError> {
    authorize(actor, action)?;

    if actor.id == target_id {
        return Err(PermissionError::CannotModifySelf);
    }

    if actor.role != Role::Admin && target_role.rank() >= actor.role.rank() {
        return Err(PermissionError::RoleHierarchy {
            actor_role: actor.role,
            target_role,
        });
    }

    Ok(())
}

/// Permission check errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    /// The actor's role does not permit the action.
    NotPermitted(Action),

    /// Suspended accounts are read-only.
    AccountSuspended,

    /// Role and status changes never apply to oneself.
    CannotModifySelf,

    /// Target ranks at or above the actor.
    RoleHierarchy { actor_role: Role, target_role: Role },
}

impl PermissionError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotPermitted(_) => "FORBIDDEN",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::CannotModifySelf => "CANNOT_MODIFY_SELF",
            Self::RoleHierarchy { .. } => "ROLE_HIERARCHY",
        }
    }
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPermitted(action) => write!(f, "Not permitted: {}", action.description()),
            Self::AccountSuspended => write!(f, "Account is suspended"),
            Self::CannotModifySelf => write!(f, "Cannot change your own role or status"),
            Self::RoleHierarchy {
                actor_role,
                target_role,
            } => write!(f, "A {actor_role} cannot manage a {target_role}"),
        }
    }
}

impl std::error::Error for PermissionError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str, role: Role) -> AuthUser {
        AuthUser {
            id: id.into(),
            name: id.into(),
            email: None,
            role,
            status: AccountStatus::Active,
            can_organize: false,
        }
    }

    #[test]
    fn test_student_can_post() {
        assert!(authorize(&actor("s", Role::Student), Action::PostContent).is_ok());
    }

    #[test]
    fn test_student_cannot_moderate() {
        assert_eq!(
            authorize(&actor("s", Role::Student), Action::ModerateContent),
            Err(PermissionError::NotPermitted(Action::ModerateContent))
        );
    }

    #[test]
    fn test_suspended_user_can_only_read() {
        let mut moderator = actor("m", Role::Moderator);
        moderator.status = AccountStatus::Suspended;

        assert_eq!(
            authorize(&moderator, Action::PostContent),
            Err(PermissionError::AccountSuspended)
        );
        assert!(authorize(&moderator, Action::ViewAuditLog).is_ok());
    }

    #[test]
    fn test_organizer_grant_allows_events() {
        let mut student = actor("s", Role::Student);
        assert!(authorize(&student, Action::CreateEvent).is_err());
        student.can_organize = true;
        assert!(authorize(&student, Action::CreateEvent).is_ok());
    }

    #[test]
    fn test_owner_needs_only_post_content() {
        let student = actor("s", Role::Student);
        assert!(authorize_owner_or_moderator(&student, "s").is_ok());
        assert!(authorize_owner_or_moderator(&student, "other").is_err());
        assert!(authorize_owner_or_moderator(&actor("m", Role::Moderator), "other").is_ok());
    }

    #[test]
    fn test_moderator_manages_students_only() {
        let moderator = actor("m", Role::Moderator);
        assert!(can_manage_user(&moderator, Action::SetUserStatus, "s", Role::Student).is_ok());
        assert_eq!(
            can_manage_user(&moderator, Action::SetUserStatus, "m2", Role::Moderator),
            Err(PermissionError::RoleHierarchy {
                actor_role: Role::Moderator,
                target_role: Role::Moderator,
            })
        );
        assert!(can_manage_user(&moderator, Action::SetUserStatus, "a", Role::Admin).is_err());
    }

    #[test]
    fn test_admin_manages_everyone_but_self() {
        let admin = actor("a", Role::Admin);
        assert!(can_manage_user(&admin, Action::SetUserStatus, "a2", Role::Admin).is_ok());
        assert!(can_manage_user(&admin, Action::AssignRoles, "m", Role::Moderator).is_ok());
        assert_eq!(
            can_manage_user(&admin, Action::AssignRoles, "a", Role::Admin),
            Err(PermissionError::CannotModifySelf)
        );
    }

    #[test]
    fn test_moderator_cannot_assign_roles() {
        assert_eq!(
            can_manage_user(
                &actor("m", Role::Moderator),
                Action::AssignRoles,
                "s",
                Role::Student
            ),
            Err(PermissionError::NotPermitted(Action::AssignRoles))
        );
    }
}
