//! Common error type.

use thiserror::Error;

/// Errors raised by the shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A string did not name a known variant.
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// The enum being parsed (e.g. "role").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Result alias for shared-type operations.
pub type Result<T> = std::result::Result<T, Error>;
