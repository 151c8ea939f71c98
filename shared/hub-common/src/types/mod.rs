//! Shared domain types.

pub mod organizer;
pub mod user;

pub use organizer::{OrganizerRequestStatus, ReviewDecision};
pub use user::{AccountStatus, PublicProfile, Role};
