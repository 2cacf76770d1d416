use std::path::Path;

use crate::commands::common::{
    entry_to_list_item, format_entry_lines, list_entries, open_database, EntryListItem,
};
use crate::error::CliError;

pub fn run_list(
    limit: usize,
    search: Option<&str>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let entries = list_entries(limit, search, &db)?;

    if as_json {
        let json_items = entries
            .iter()
            .map(entry_to_list_item)
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}
