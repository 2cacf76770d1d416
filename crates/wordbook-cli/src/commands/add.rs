use std::path::Path;

use wordbook_core::db::{EntryRepository, SqliteEntryRepository};
use wordbook_core::detect::find_match;

use crate::commands::common::{
    maybe_sync_context, normalize_word, open_database, push_after_mutation, resolve_description,
    text_preview,
};
use crate::error::CliError;

pub async fn run_add(
    word: &str,
    description_parts: &[String],
    update: bool,
    force: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let word = normalize_word(word)?;
    let description = resolve_description(description_parts)?;

    let db = open_database(db_path)?;
    let repo = SqliteEntryRepository::new(db.connection());

    let existing = repo.get_all()?;
    let entry = match find_match(&word, &existing) {
        Some(matched) if update => repo.update(matched.id, &word, &description)?,
        Some(matched) if !force => {
            return Err(CliError::DuplicateWord(format!(
                "'{}' looks like entry {} '{}' ({}). Re-run with --update to edit it or --force to add anyway.",
                word,
                matched.id,
                matched.word,
                text_preview(&matched.description, 40),
            )));
        }
        _ => repo.create(&word, &description)?,
    };

    let context = maybe_sync_context(&db).await?;
    push_after_mutation(&db, context.as_ref(), entry.id).await?;

    println!("{} {}", entry.id, entry.word);
    Ok(())
}
