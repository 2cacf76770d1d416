//! Local/cloud reconciliation.
//!
//! The device is the durable source of truth and the cloud row set is a
//! best-effort mirror. Every local mutation pushes outward immediately,
//! and a pull pass merges cloud rows back in by timestamp on login and
//! reconnect. Deletions travel push-direction only: a row missing from
//! the cloud listing never deletes anything locally.

mod status;

pub use status::{StatusReporter, SyncStatus};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::db::{EntryRepository, SettingsRepository};
use crate::error::StorageError;
use crate::models::{Entry, EntryId, RemoteId};
use crate::remote::{DeleteTarget, RemoteStore, SyncError};
use crate::session::SessionContext;

/// Result of pushing one entry's state to the cloud store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The cloud row now matches the local entry
    Synced(RemoteId),
    /// Disconnected or transient failure; the entry stays local-only until
    /// the next flush
    Deferred,
    /// The cloud store refused the write; local state stands untouched
    Rejected,
    /// The entry disappeared locally before the push ran
    Missing,
}

/// Result of pushing a deletion to the cloud store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Completed,
    Deferred,
    Rejected,
}

/// Tally of a full local-state flush.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    pub synced: usize,
    pub deferred: usize,
    pub rejected: usize,
    pub missing: usize,
}

impl PushReport {
    #[must_use]
    pub const fn final_status(&self) -> SyncStatus {
        if self.rejected > 0 {
            SyncStatus::Error
        } else if self.deferred > 0 {
            SyncStatus::Offline
        } else {
            SyncStatus::Synced
        }
    }
}

/// What a pull pass did to the local set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Result of a pull-and-merge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Merged(MergeSummary),
    Deferred,
    Rejected,
}

/// Orchestrates push-on-mutation and pull-merge-on-connect between the
/// local store and a [`RemoteStore`].
///
/// Sync is advisory relative to the local record: a failed push never
/// aborts or reverses a completed local mutation, and the only local
/// write a push performs is recording a newly assigned remote id. Each
/// entry's pushes run under a per-id lock so an edit racing an in-flight
/// push cannot be clobbered by a stale snapshot.
pub struct Reconciler<R: RemoteStore> {
    remote: R,
    reporter: StatusReporter,
    locks: Mutex<HashMap<EntryId, Arc<AsyncMutex<()>>>>,
}

impl<R: RemoteStore> Reconciler<R> {
    pub fn new(remote: R) -> Self {
        Self::with_reporter(remote, StatusReporter::new())
    }

    pub fn with_reporter(remote: R, reporter: StatusReporter) -> Self {
        Self {
            remote,
            reporter,
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }

    fn lock_for(&self, id: EntryId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    /// Push one entry's current state to the cloud store.
    ///
    /// Called after every local create or update. Disconnected sessions
    /// defer silently with no user-facing error; the entry simply stays
    /// unsynced until the next flush.
    pub async fn push_entry(
        &self,
        repo: &impl EntryRepository,
        session: &SessionContext,
        id: EntryId,
    ) -> Result<PushOutcome, StorageError> {
        if !session.is_connected() {
            self.reporter.set(SyncStatus::Offline);
            return Ok(PushOutcome::Deferred);
        }

        self.reporter.set(SyncStatus::Syncing);
        let outcome = self.push_locked(repo, session, id).await?;
        self.reporter.set(match outcome {
            PushOutcome::Synced(_) => SyncStatus::Synced,
            PushOutcome::Deferred => SyncStatus::Offline,
            PushOutcome::Rejected => SyncStatus::Error,
            PushOutcome::Missing => SyncStatus::Idle,
        });
        Ok(outcome)
    }

    /// Upsert under the entry's lock, re-reading first so the freshest
    /// local row is what goes over the wire.
    async fn push_locked(
        &self,
        repo: &impl EntryRepository,
        session: &SessionContext,
        id: EntryId,
    ) -> Result<PushOutcome, StorageError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let Some(entry) = repo.get(id)? else {
            return Ok(PushOutcome::Missing);
        };

        match self.remote.upsert(session, &entry).await {
            Ok(remote_id) => {
                // Record the assigned id so the next push updates the same
                // row instead of inserting a duplicate.
                if entry.remote_id.is_none() {
                    repo.bind_remote_id(id, remote_id)?;
                }
                Ok(PushOutcome::Synced(remote_id))
            }
            Err(SyncError::Unavailable(reason)) => {
                tracing::debug!("Push deferred for entry {id}: {reason}");
                Ok(PushOutcome::Deferred)
            }
            Err(SyncError::Rejected(reason)) => {
                tracing::warn!("Cloud store rejected entry {id}: {reason}");
                Ok(PushOutcome::Rejected)
            }
        }
    }

    /// Push a deletion to the cloud store after the local row is gone.
    ///
    /// Best-effort only. A deferred deletion is not queued anywhere, so
    /// the cloud row can resurface on a later pull.
    pub async fn push_delete(&self, session: &SessionContext, removed: &Entry) -> DeleteOutcome {
        if !session.is_connected() {
            self.reporter.set(SyncStatus::Offline);
            return DeleteOutcome::Deferred;
        }

        let lock = self.lock_for(removed.id);
        let _guard = lock.lock().await;

        self.reporter.set(SyncStatus::Syncing);
        let target = DeleteTarget::for_entry(removed);
        match self.remote.delete(session, &target).await {
            Ok(()) => {
                self.reporter.set(SyncStatus::Synced);
                DeleteOutcome::Completed
            }
            Err(SyncError::Unavailable(reason)) => {
                tracing::debug!("Delete push deferred for entry {}: {reason}", removed.id);
                self.reporter.set(SyncStatus::Offline);
                DeleteOutcome::Deferred
            }
            Err(SyncError::Rejected(reason)) => {
                tracing::warn!("Cloud store rejected deleting entry {}: {reason}", removed.id);
                self.reporter.set(SyncStatus::Error);
                DeleteOutcome::Rejected
            }
        }
    }

    /// Re-send the full current local state to the cloud store.
    ///
    /// There is no durable outbox; this flush is how pushes dropped
    /// during an offline window get recovered. Entries already carrying a
    /// remote id are re-upserted so the cloud copy converges on local
    /// content.
    pub async fn push_all(
        &self,
        repo: &impl EntryRepository,
        session: &SessionContext,
    ) -> Result<PushReport, StorageError> {
        let mut report = PushReport::default();

        if !session.is_connected() {
            self.reporter.set(SyncStatus::Offline);
            report.deferred = repo.get_all()?.len();
            return Ok(report);
        }

        self.reporter.set(SyncStatus::Syncing);
        for entry in repo.get_all()? {
            match self.push_locked(repo, session, entry.id).await? {
                PushOutcome::Synced(_) => report.synced += 1,
                PushOutcome::Deferred => report.deferred += 1,
                PushOutcome::Rejected => report.rejected += 1,
                PushOutcome::Missing => report.missing += 1,
            }
        }

        self.reporter.set(report.final_status());
        Ok(report)
    }

    /// Pull the owner's cloud rows and merge them into the local set.
    ///
    /// A cloud row wins only when its timestamp is strictly newer than the
    /// linked local entry's; ties keep the local content since local is
    /// the live edit surface. Rows unknown locally are inserted. Entries
    /// without a remote id are never touched, and nothing is ever deleted
    /// because it is absent from the listing.
    pub async fn pull_and_merge(
        &self,
        repo: &impl EntryRepository,
        session: &SessionContext,
    ) -> Result<PullOutcome, StorageError> {
        if !session.is_connected() {
            self.reporter.set(SyncStatus::Offline);
            return Ok(PullOutcome::Deferred);
        }

        self.reporter.set(SyncStatus::Syncing);
        let rows = match self.remote.list_all(session).await {
            Ok(rows) => rows,
            Err(SyncError::Unavailable(reason)) => {
                tracing::debug!("Pull deferred: {reason}");
                self.reporter.set(SyncStatus::Offline);
                return Ok(PullOutcome::Deferred);
            }
            Err(SyncError::Rejected(reason)) => {
                tracing::warn!("Cloud store rejected the pull: {reason}");
                self.reporter.set(SyncStatus::Error);
                return Ok(PullOutcome::Rejected);
            }
        };

        let local = repo.get_all()?;
        let by_remote_id: HashMap<RemoteId, &Entry> = local
            .iter()
            .filter_map(|entry| entry.remote_id.map(|remote_id| (remote_id, entry)))
            .collect();

        let mut summary = MergeSummary::default();
        for row in &rows {
            match by_remote_id.get(&row.id) {
                None => {
                    repo.insert_pulled(row)?;
                    summary.inserted += 1;
                }
                Some(existing) if row.updated_at > existing.updated_at => {
                    repo.overwrite_from_remote(existing.id, row)?;
                    summary.updated += 1;
                }
                Some(_) => summary.unchanged += 1,
            }
        }

        tracing::info!(
            "Merged {} cloud rows: {} inserted, {} updated, {} unchanged",
            rows.len(),
            summary.inserted,
            summary.updated,
            summary.unchanged
        );
        self.reporter.set(SyncStatus::Synced);
        Ok(PullOutcome::Merged(summary))
    }
}

/// Record the owner scope the local set is bound to, detaching every
/// cloud link when the owner changed.
///
/// Remote ids are only meaningful under the owner that assigned them.
/// After a different account signs in, stale links would make the next
/// flush target rows belonging to someone else, so the entries drop back
/// to "never pushed". Signing back into the same owner keeps the links.
pub fn rebind_owner_scope(
    repo: &impl EntryRepository,
    settings: &impl SettingsRepository,
    owner_key: &str,
) -> Result<usize, StorageError> {
    match settings.sync_owner()? {
        Some(previous) if previous == owner_key => Ok(0),
        _ => {
            let cleared = repo.clear_remote_ids()?;
            settings.set_sync_owner(owner_key)?;
            if cleared > 0 {
                tracing::info!(
                    "Owner scope changed to {owner_key}; detached {cleared} entries from their cloud rows"
                );
            }
            Ok(cleared)
        }
    }
}
