use std::path::Path;

use wordbook_core::config::{CloudConfig, ScopeMode};
use wordbook_core::db::{
    EntryRepository, SettingsRepository, SqliteEntryRepository, SqliteSettingsRepository,
};

use crate::auth::SupabaseAuthService;
use crate::commands::common::{format_sync_timestamp, open_database};
use crate::config_file;
use crate::error::CliError;

pub async fn run_status(db_path: &Path) -> Result<(), CliError> {
    let config = config_file::load().map_err(CliError::Config)?;
    let db = open_database(db_path)?;
    let repo = SqliteEntryRepository::new(db.connection());
    let settings = SqliteSettingsRepository::new(db.connection());

    if config.is_configured() {
        println!("Cloud: configured ({} scope)", config.scope_mode);
        match config.scope_mode {
            ScopeMode::User => match signed_in_label(&config).await {
                Some(label) => println!("Account: {label}"),
                None => println!("Account: not signed in (run `wordbook login`)"),
            },
            ScopeMode::Device => println!("Device: {}", settings.device_id()?),
        }
    } else {
        println!("Cloud: not configured (run `wordbook config init`)");
    }

    let total = repo.get_all()?.len();
    let pending = repo.count_unsynced()?;
    println!("Entries: {total} ({pending} not yet pushed)");

    match settings.last_synced_at()? {
        Some(timestamp) => println!("Last sync: {}", format_sync_timestamp(timestamp)),
        None => println!("Last sync: never"),
    }

    Ok(())
}

async fn signed_in_label(config: &CloudConfig) -> Option<String> {
    let endpoints = config.endpoints().ok()?;
    let service =
        SupabaseAuthService::new(&endpoints.supabase_url, endpoints.supabase_anon_key).ok()?;
    let session = service.restore_session().await.ok()??;
    let user = session.user;
    Some(user.email.unwrap_or(user.id))
}
