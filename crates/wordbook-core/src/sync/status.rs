//! Sync status surface shown alongside the notebook.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Offline,
    Error,
    Connected,
}

impl SyncStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing...",
            Self::Synced => "synced",
            Self::Offline => "offline",
            Self::Error => "sync error",
            Self::Connected => "connected",
        }
    }

    /// How long the status stays visible before falling back to idle.
    /// `None` means it holds until the next transition.
    #[must_use]
    pub const fn auto_clear(self) -> Option<Duration> {
        match self {
            Self::Synced => Some(Duration::from_secs(3)),
            Self::Connected => Some(Duration::from_secs(2)),
            Self::Error => Some(Duration::from_secs(5)),
            Self::Idle | Self::Syncing | Self::Offline => None,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.label())
    }
}

struct Inner {
    tx: watch::Sender<SyncStatus>,
    epoch: AtomicU64,
}

/// Publishes the current [`SyncStatus`] to any number of observers.
///
/// Transient statuses revert to [`SyncStatus::Idle`] after their
/// [`auto_clear`](SyncStatus::auto_clear) delay unless a newer status
/// lands first. The epoch counter ties each pending revert to the
/// transition that scheduled it.
#[derive(Clone)]
pub struct StatusReporter {
    inner: Arc<Inner>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::default());
        Self {
            inner: Arc::new(Inner {
                tx,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn current(&self) -> SyncStatus {
        *self.inner.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.tx.subscribe()
    }

    pub fn set(&self, status: SyncStatus) {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_replace(status);

        let Some(delay) = status.auto_clear() else {
            return;
        };
        // Without a runtime the status simply holds until the next set.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.epoch.load(Ordering::SeqCst) == epoch {
                inner.tx.send_replace(SyncStatus::Idle);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_without_runtime_holds_status() {
        let reporter = StatusReporter::new();
        reporter.set(SyncStatus::Synced);
        assert_eq!(reporter.current(), SyncStatus::Synced);
    }

    #[tokio::test(start_paused = true)]
    async fn synced_reverts_to_idle_after_delay() {
        let reporter = StatusReporter::new();
        reporter.set(SyncStatus::Synced);
        assert_eq!(reporter.current(), SyncStatus::Synced);

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(reporter.current(), SyncStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_status_cancels_pending_revert() {
        let reporter = StatusReporter::new();
        reporter.set(SyncStatus::Error);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        reporter.set(SyncStatus::Syncing);

        // Past the error's five second window; the revert must not fire.
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(reporter.current(), SyncStatus::Syncing);
    }

    #[tokio::test(start_paused = true)]
    async fn connected_clears_faster_than_error() {
        let reporter = StatusReporter::new();
        reporter.set(SyncStatus::Connected);

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(reporter.current(), SyncStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_holds_until_replaced() {
        let reporter = StatusReporter::new();
        reporter.set(SyncStatus::Offline);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(reporter.current(), SyncStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_transitions() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.set(SyncStatus::Syncing);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SyncStatus::Syncing);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(SyncStatus::Idle.label(), "idle");
        assert_eq!(SyncStatus::Syncing.label(), "syncing...");
        assert_eq!(SyncStatus::Error.label(), "sync error");
    }
}
