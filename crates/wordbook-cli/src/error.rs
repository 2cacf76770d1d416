use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] wordbook_core::StorageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No word provided")]
    EmptyWord,
    #[error("Entry description cannot be empty")]
    EmptyDescription,
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Entry ID must be a number, got '{0}'")]
    InvalidEntryId(String),
    #[error("Entry not found for id: {0}")]
    EntryNotFound(String),
    #[error("{0}")]
    DuplicateWord(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Cloud sync is not configured. Run `wordbook config init --supabase-url <URL> --supabase-anon-key <KEY>` first."
    )]
    SyncNotConfigured,
    #[error("Not signed in. Run `wordbook login --email <email> --password <password>` first.")]
    NotSignedIn,
}
