use std::path::Path;

use wordbook_core::db::{EntryRepository, SqliteEntryRepository};

use crate::commands::common::{
    capture_editor_input_with_initial, maybe_sync_context, normalize_word, open_database,
    push_after_mutation, resolve_entry,
};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    word: Option<&str>,
    description: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteEntryRepository::new(db.connection());
    let entry = resolve_entry(&repo, id)?;

    let new_word = match word {
        Some(value) => normalize_word(value)?,
        None => entry.word.clone(),
    };
    let new_description = match description {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(CliError::EmptyDescription);
            }
            trimmed.to_string()
        }
        None if word.is_none() => {
            let Some(edited) = capture_editor_input_with_initial(&entry.description)? else {
                return Err(CliError::EmptyDescription);
            };
            edited
        }
        None => entry.description.clone(),
    };

    if new_word == entry.word && new_description == entry.description {
        println!("{}", entry.id);
        return Ok(());
    }

    let updated = repo.update(entry.id, &new_word, &new_description)?;

    let context = maybe_sync_context(&db).await?;
    push_after_mutation(&db, context.as_ref(), updated.id).await?;

    println!("{} {}", updated.id, updated.word);
    Ok(())
}
