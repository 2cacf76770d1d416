//! Cloud-side record store.
//!
//! Entries mirror into a single cloud table `words`, partitioned by an
//! owner key; every read and write filters on it. The HTTP implementation
//! speaks the PostgREST dialect; an in-memory implementation backs tests.

mod memory;
mod rest;

pub use memory::MemoryRemoteStore;
pub use rest::RestRemoteStore;

use thiserror::Error;

use crate::models::{Entry, RemoteEntry, RemoteId};
use crate::session::SessionContext;

/// Errors from cloud-side operations.
///
/// `Unavailable` is transient: nothing was lost, and a later flush will
/// re-send the local state. `Rejected` means the remote refused this
/// operation and a blind retry would refuse again.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cloud store unavailable: {0}")]
    Unavailable(String),
    #[error("Cloud store rejected the operation: {0}")]
    Rejected(String),
}

/// Target of a remote delete.
///
/// Installations that synced before remote ids were mirrored locally left
/// rows behind that can only be matched by content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    ByRemoteId(RemoteId),
    ByContent { word: String, description: String },
}

impl DeleteTarget {
    /// Prefer the precise id when the entry carries one
    #[must_use]
    pub fn for_entry(entry: &Entry) -> Self {
        entry.remote_id.map_or_else(
            || Self::ByContent {
                word: entry.word.clone(),
                description: entry.description.clone(),
            },
            Self::ByRemoteId,
        )
    }
}

/// Row-level access to the cloud `words` table, scoped by the session's
/// owner. Rows of other owners are invisible to every operation.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Insert the entry, or update the row it is linked to.
    ///
    /// Updating a row that no longer exists under this owner is a
    /// `Rejected` error, not a re-insert.
    async fn upsert(
        &self,
        session: &SessionContext,
        entry: &Entry,
    ) -> Result<RemoteId, SyncError>;

    /// Delete the targeted row(s). Deleting what is already gone succeeds.
    async fn delete(
        &self,
        session: &SessionContext,
        target: &DeleteTarget,
    ) -> Result<(), SyncError>;

    /// List every row under the session's owner, newest first
    async fn list_all(&self, session: &SessionContext) -> Result<Vec<RemoteEntry>, SyncError>;
}

/// Owner key for a remote operation, or the rejection for a session that
/// has none
pub(crate) fn require_owner_key(session: &SessionContext) -> Result<String, SyncError> {
    session
        .owner()
        .map(crate::session::OwnerScope::owner_key)
        .ok_or_else(|| SyncError::Rejected("session has no owner scope".to_string()))
}
