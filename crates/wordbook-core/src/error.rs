//! Error types for wordbook-core

use thiserror::Error;

/// Result type alias for local storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by the on-device store.
///
/// These abort the triggering operation and are surfaced to the caller.
/// Remote sync failures are a separate taxonomy (`remote::SyncError`) and
/// never turn into a `StorageError`.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
