use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use wordbook_core::config::{CloudConfig, ScopeMode};
use wordbook_core::db::{
    Database, EntryRepository, SettingsRepository, SqliteEntryRepository,
    SqliteSettingsRepository,
};
use wordbook_core::remote::RestRemoteStore;
use wordbook_core::session::SessionContext;
use wordbook_core::sync::{rebind_owner_scope, Reconciler};
use wordbook_core::{Entry, EntryId};

use crate::auth::SupabaseAuthService;
use crate::config_file;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: i64,
    pub word: String,
    pub description: String,
    pub updated_at: i64,
    pub relative_time: String,
    pub synced: bool,
}

/// Everything a command needs to reach the cloud store.
pub struct SyncContext {
    pub session: SessionContext,
    pub reconciler: Reconciler<RestRemoteStore>,
}

/// Best-effort sync context for mutation commands.
///
/// Returns `None` when the cloud is not configured or no credential is
/// available; the command then completes locally and stays quiet about it.
pub async fn maybe_sync_context(db: &Database) -> Result<Option<SyncContext>, CliError> {
    let config = match config_file::load() {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!("Ignoring unreadable cloud config: {error}");
            return Ok(None);
        }
    };
    if !config.is_configured() {
        tracing::debug!("Cloud sync not configured; staying local");
        return Ok(None);
    }

    match sync_context_for(db, &config).await {
        Ok(context) => Ok(Some(context)),
        Err(CliError::NotSignedIn) => {
            tracing::debug!("No stored session; staying local");
            Ok(None)
        }
        Err(CliError::Auth(message)) => {
            tracing::warn!("Could not restore session: {message}");
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

/// Sync context for the commands whose whole point is the cloud
/// (`sync`, `login`). Missing configuration is an error here.
pub async fn require_sync_context(db: &Database) -> Result<SyncContext, CliError> {
    let config = config_file::load().map_err(CliError::Config)?;
    if !config.is_configured() {
        return Err(CliError::SyncNotConfigured);
    }
    sync_context_for(db, &config).await
}

async fn sync_context_for(db: &Database, config: &CloudConfig) -> Result<SyncContext, CliError> {
    let endpoints = config.endpoints().map_err(CliError::Config)?;

    let session = match config.scope_mode {
        ScopeMode::Device => {
            let settings = SqliteSettingsRepository::new(db.connection());
            SessionContext::for_device(settings.device_id()?)
        }
        ScopeMode::User => {
            let service = SupabaseAuthService::new(
                &endpoints.supabase_url,
                endpoints.supabase_anon_key.clone(),
            )
            .map_err(|error| CliError::Auth(error.to_string()))?;
            let Some(auth_session) = service
                .restore_session()
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?
            else {
                return Err(CliError::NotSignedIn);
            };
            SessionContext::for_user(&auth_session)
        }
    };

    let remote = RestRemoteStore::new(&endpoints.supabase_url, endpoints.supabase_anon_key)
        .map_err(|error| CliError::Config(error.to_string()))?;

    // Detach remote links left behind by a different owner before the
    // first operation under this one runs.
    if let Some(owner) = session.owner() {
        let entries = SqliteEntryRepository::new(db.connection());
        let settings = SqliteSettingsRepository::new(db.connection());
        rebind_owner_scope(&entries, &settings, &owner.owner_key())?;
    }

    Ok(SyncContext {
        session,
        reconciler: Reconciler::new(remote),
    })
}

/// Best-effort push after a local mutation. Local state is already
/// durable; a failed push only affects the sync status.
pub async fn push_after_mutation(
    db: &Database,
    context: Option<&SyncContext>,
    id: EntryId,
) -> Result<(), CliError> {
    let Some(context) = context else {
        return Ok(());
    };
    let repo = SqliteEntryRepository::new(db.connection());
    context
        .reconciler
        .push_entry(&repo, &context.session, id)
        .await?;
    Ok(())
}

pub fn list_entries(
    limit: usize,
    search: Option<&str>,
    db: &Database,
) -> Result<Vec<Entry>, CliError> {
    let repo = SqliteEntryRepository::new(db.connection());
    let mut entries = repo.get_all()?;
    if let Some(term) = search {
        entries = filter_entries(entries, term);
    }
    entries.truncate(limit);
    Ok(entries)
}

/// Case-insensitive filter on word or description.
pub fn filter_entries(entries: Vec<Entry>, term: &str) -> Vec<Entry> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| {
            entry.word.to_lowercase().contains(&needle)
                || entry.description.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn resolve_entry(repo: &impl EntryRepository, raw_id: &str) -> Result<Entry, CliError> {
    let trimmed = raw_id.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyEntryId);
    }
    let id = trimmed
        .parse::<EntryId>()
        .map_err(|_| CliError::InvalidEntryId(trimmed.to_string()))?;
    repo.get(id)?
        .ok_or_else(|| CliError::EntryNotFound(trimmed.to_string()))
}

pub fn format_entry_lines(entries: &[Entry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let marker = if entry.is_synced() { ' ' } else { '*' };
            let word = text_preview(&entry.word, 20);
            let preview = text_preview(&entry.description, 40);
            let relative_time = format_relative_time(entry.updated_at, now_ms);
            format!(
                "{:>4}{marker} {word:<20}  {preview:<40}  {relative_time}",
                entry.id
            )
        })
        .collect()
}

pub fn entry_to_list_item(entry: &Entry) -> EntryListItem {
    let now_ms = Utc::now().timestamp_millis();
    EntryListItem {
        id: entry.id.as_i64(),
        word: entry.word.clone(),
        description: entry.description.clone(),
        updated_at: entry.updated_at,
        relative_time: format_relative_time(entry.updated_at, now_ms),
        synced: entry.is_synced(),
    }
}

/// First line of `text`, whitespace collapsed, truncated to `max_chars`.
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_word(word: &str) -> Result<String, CliError> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyWord)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Resolve a description from args, piped stdin or `$EDITOR`, in that order.
pub fn resolve_description(description_parts: &[String]) -> Result<String, CliError> {
    if let Some(description) = normalize_content(&description_parts.join(" ")) {
        return Ok(description);
    }

    if let Some(description) = read_piped_stdin()? {
        return Ok(description);
    }

    if let Some(description) = capture_editor_input()? {
        return Ok(description);
    }

    Err(CliError::EmptyDescription)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_entry_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let description = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&description))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_entry_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("wordbook-entry-{}-{now}.txt", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("WORDBOOK_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| panic!("Failed to resolve CLI data directory"))
        .join("wordbook")
        .join("wordbook.db")
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(path)?)
}
