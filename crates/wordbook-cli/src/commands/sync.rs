use std::path::Path;

use wordbook_core::db::{
    Database, SettingsRepository, SqliteEntryRepository, SqliteSettingsRepository,
};
use wordbook_core::sync::PullOutcome;
use wordbook_core::util::unix_timestamp_ms;

use crate::commands::common::{open_database, require_sync_context, SyncContext};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let context = require_sync_context(&db).await?;
    flush_and_merge(&db, &context).await
}

/// Push the full local state, then merge the cloud listing back in.
///
/// Flushing first keeps a stale cloud row from overwriting a local edit
/// made while offline.
pub async fn flush_and_merge(db: &Database, context: &SyncContext) -> Result<(), CliError> {
    let repo = SqliteEntryRepository::new(db.connection());

    let report = context
        .reconciler
        .push_all(&repo, &context.session)
        .await?;
    println!(
        "Pushed: {} synced, {} deferred, {} rejected",
        report.synced, report.deferred, report.rejected
    );

    match context
        .reconciler
        .pull_and_merge(&repo, &context.session)
        .await?
    {
        PullOutcome::Merged(summary) => {
            println!(
                "Merged: {} new, {} updated, {} unchanged",
                summary.inserted, summary.updated, summary.unchanged
            );
            let settings = SqliteSettingsRepository::new(db.connection());
            settings.set_last_synced_at(unix_timestamp_ms())?;
        }
        PullOutcome::Deferred => println!("Merge skipped: cloud unavailable"),
        PullOutcome::Rejected => println!("Merge skipped: cloud rejected the request"),
    }

    println!("Status: {}", context.reconciler.reporter().current());
    Ok(())
}
