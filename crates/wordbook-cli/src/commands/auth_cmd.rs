use std::path::Path;

use wordbook_core::auth::SignUpOutcome;
use wordbook_core::config::{CloudConfig, ScopeMode};

use crate::auth::{clear_stored_session, load_stored_session, SupabaseAuthService};
use crate::commands::common::{open_database, require_sync_context};
use crate::commands::sync::flush_and_merge;
use crate::config_file;
use crate::error::CliError;

pub async fn run_login(email: &str, password: &str, db_path: &Path) -> Result<(), CliError> {
    let service = auth_service_for_accounts()?;
    let session = service
        .sign_in(email, password)
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?;
    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
    println!("Signed in as {email_label}");

    // First sync under this account: flush local entries, then pull the
    // cloud notebook down.
    let db = open_database(db_path)?;
    let context = require_sync_context(&db).await?;
    flush_and_merge(&db, &context).await
}

pub async fn run_signup(email: &str, password: &str) -> Result<(), CliError> {
    let service = auth_service_for_accounts()?;
    match service
        .sign_up(email, password)
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?
    {
        SignUpOutcome::SignedIn(session) => {
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Account created; signed in as {email_label}");
            println!("Run `wordbook sync` to push your notebook.");
        }
        SignUpOutcome::ConfirmationRequired => {
            println!("Account created. Confirm via the email link, then run `wordbook login`.");
        }
    }
    Ok(())
}

pub async fn run_logout() -> Result<(), CliError> {
    let stored = load_stored_session().map_err(|error| CliError::Auth(error.to_string()))?;
    let Some(session) = stored else {
        println!("Not signed in.");
        return Ok(());
    };

    match configured_auth_service() {
        Ok(service) => service
            .sign_out(&session.access_token)
            .await
            .map_err(|error| CliError::Auth(error.to_string()))?,
        // No usable backend config; just drop the stored session.
        Err(_) => clear_stored_session().map_err(|error| CliError::Auth(error.to_string()))?,
    }

    println!("Signed out. Local entries are untouched; sign in again to resume syncing.");
    Ok(())
}

pub async fn run_whoami() -> Result<(), CliError> {
    let service = configured_auth_service()?;
    match service
        .restore_session()
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?
    {
        Some(session) => {
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("{} ({})", email_label, session.user.id);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Auth service for login/signup, which only make sense in user scope.
fn auth_service_for_accounts() -> Result<SupabaseAuthService, CliError> {
    let config = load_configured()?;
    if config.scope_mode != ScopeMode::User {
        return Err(CliError::Config(
            "Scope mode is 'device'; run `wordbook config init --scope-mode user` to use accounts."
                .to_string(),
        ));
    }
    auth_service(&config)
}

fn configured_auth_service() -> Result<SupabaseAuthService, CliError> {
    let config = load_configured()?;
    auth_service(&config)
}

fn load_configured() -> Result<CloudConfig, CliError> {
    let config = config_file::load().map_err(CliError::Config)?;
    if !config.is_configured() {
        return Err(CliError::SyncNotConfigured);
    }
    Ok(config)
}

fn auth_service(config: &CloudConfig) -> Result<SupabaseAuthService, CliError> {
    let endpoints = config.endpoints().map_err(CliError::Config)?;
    SupabaseAuthService::new(&endpoints.supabase_url, endpoints.supabase_anon_key)
        .map_err(|error| CliError::Auth(error.to_string()))
}
