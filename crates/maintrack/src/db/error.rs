//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// A stored record could not be decoded into a valid domain value.
    #[error("Corrupt record '{id}': {reason}")]
    CorruptRecord { id: String, reason: String },

    /// A record was rejected before writing because it breaks a job invariant.
    #[error("Refusing to store job '{id}': {reason}")]
    InvariantViolation { id: String, reason: String },

    /// An insert collided with an existing id.
    #[error("Record '{0}' already exists")]
    Duplicate(String),

    /// JSON encoding of an embedded column failed.
    #[error("Failed to encode column: {0}")]
    Encode(#[from] serde_json::Error),
}
