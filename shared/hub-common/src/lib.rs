//! Campus Hub Common Library
//!
//! Shared types used by the server and by API clients.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
