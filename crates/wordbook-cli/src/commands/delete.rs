use std::path::Path;

use wordbook_core::db::{EntryRepository, SqliteEntryRepository};

use crate::commands::common::{maybe_sync_context, open_database, resolve_entry};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteEntryRepository::new(db.connection());
    let removed = resolve_entry(&repo, id)?;

    // The local delete is final regardless of what the cloud says.
    repo.delete(removed.id)?;

    if let Some(context) = maybe_sync_context(&db).await? {
        context
            .reconciler
            .push_delete(&context.session, &removed)
            .await;
    }

    println!("{}", removed.id);
    Ok(())
}
