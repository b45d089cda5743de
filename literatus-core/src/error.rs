//! Error types for literatus-core
//!
//! Defines engine error types using thiserror for clear error propagation.
//! Every public operation returns these as values; nothing is thrown across
//! the comparison-session boundary.

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Subject, competitor, or book referenced by id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Judgment submitted against a missing or already-resolved session,
    /// or an operation applied to a book in the wrong state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller attempted to touch a book owned by someone else
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Gap or duplicate detected in tier positions after a commit.
    /// Indicates a bug in the engine, not a user error.
    #[error("Position invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid user input (unknown tier name, empty title, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
