//! Error types for tag operations.

use thiserror::Error;

/// Errors that can occur during tag operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference is not a valid name or content ID.
    #[error("invalid reference format: {name}: {reason}")]
    InvalidReference { name: String, reason: String },

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience type alias for tag operations.
pub type Result<T> = std::result::Result<T, RefError>;
