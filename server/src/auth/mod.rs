//! Authentication
//!
//! Verifies identity-provider tokens and loads the caller's role record.
//! The identity provider itself is external; this service never handles
//! passwords or issues sessions.

mod error;
pub mod identity;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use identity::{resolve_identity, Identity, IdentitySource};
pub use middleware::{require_auth, AuthUser};
