//! Permission system types and utilities.
//!
//! Role-based: each [`Action`] names the roles allowed to perform it, and the
//! resolver adds the account-status, ownership and hierarchy rules.

pub mod action;
pub mod resolver;

pub use action::Action;
pub use resolver::{authorize, authorize_owner_or_moderator, can_manage_user, PermissionError};
