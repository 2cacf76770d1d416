//! In-memory cloud store, used by tests in place of the HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{require_owner_key, DeleteTarget, RemoteStore, SyncError};
use crate::models::{Entry, RemoteEntry, RemoteId};
use crate::session::SessionContext;

#[derive(Default)]
struct State {
    rows: Vec<RemoteEntry>,
    next_id: i64,
}

/// A `RemoteStore` holding its rows in memory.
///
/// Mirrors the HTTP implementation's observable behavior: owner filtering
/// on every operation, `Rejected` updates against missing rows, deletes
/// that succeed when nothing matches, and an `offline` switch standing in
/// for a dead network.
#[derive(Default)]
pub struct MemoryRemoteStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert a row directly, bypassing the store contract
    pub fn seed_row(
        &self,
        owner: &str,
        word: &str,
        description: &str,
        updated_at: i64,
    ) -> RemoteId {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.next_id += 1;
        let id = RemoteId::new(state.next_id);
        state.rows.push(RemoteEntry {
            id,
            owner: owner.to_string(),
            word: word.to_string(),
            description: description.to_string(),
            updated_at,
        });
        id
    }

    /// Remove a row directly, simulating a deletion from another device
    pub fn remove_row(&self, id: RemoteId) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.rows.retain(|row| row.id != id);
    }

    /// Snapshot of the rows under one owner, for assertions
    #[must_use]
    pub fn rows_for(&self, owner: &str) -> Vec<RemoteEntry> {
        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state
            .rows
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect()
    }

    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("network is offline".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn upsert(
        &self,
        session: &SessionContext,
        entry: &Entry,
    ) -> Result<RemoteId, SyncError> {
        self.check_online()?;
        let owner = require_owner_key(session)?;

        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(remote_id) = entry.remote_id {
            let row = state
                .rows
                .iter_mut()
                .find(|row| row.id == remote_id && row.owner == owner)
                .ok_or_else(|| {
                    SyncError::Rejected(format!(
                        "no row {remote_id} under owner scope {owner}"
                    ))
                })?;
            row.word = entry.word.clone();
            row.description = entry.description.clone();
            row.updated_at = entry.updated_at;
            Ok(remote_id)
        } else {
            state.next_id += 1;
            let id = RemoteId::new(state.next_id);
            state.rows.push(RemoteEntry {
                id,
                owner,
                word: entry.word.clone(),
                description: entry.description.clone(),
                updated_at: entry.updated_at,
            });
            Ok(id)
        }
    }

    async fn delete(
        &self,
        session: &SessionContext,
        target: &DeleteTarget,
    ) -> Result<(), SyncError> {
        self.check_online()?;
        let owner = require_owner_key(session)?;

        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match target {
            DeleteTarget::ByRemoteId(remote_id) => {
                state
                    .rows
                    .retain(|row| !(row.id == *remote_id && row.owner == owner));
            }
            DeleteTarget::ByContent { word, description } => {
                state.rows.retain(|row| {
                    !(row.owner == owner && row.word == *word && row.description == *description)
                });
            }
        }
        Ok(())
    }

    async fn list_all(&self, session: &SessionContext) -> Result<Vec<RemoteEntry>, SyncError> {
        self.check_online()?;
        let owner = require_owner_key(session)?;

        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut rows: Vec<RemoteEntry> = state
            .rows
            .iter()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }
}
