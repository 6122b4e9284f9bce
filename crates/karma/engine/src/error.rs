//! Error types for the karma engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the ledger and its snapshot stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The persisted snapshot exists but cannot be understood.
    ///
    /// Fatal at startup: the ledger refuses to come up empty over user data.
    #[error("ledger snapshot at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Flushing the snapshot failed; the in-memory mutation was rolled back.
    ///
    /// Carries the store's own error as its source.
    #[error("failed to persist ledger snapshot: {0}")]
    Persist(#[source] Box<LedgerError>),

    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A thread panicked while holding the ledger lock.
    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("score for '{key}' would overflow")]
    ScoreOverflow { key: String },
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
