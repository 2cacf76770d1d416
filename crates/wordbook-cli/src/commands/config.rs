use std::env;

use wordbook_core::config::{CloudConfig, ScopeMode};
use wordbook_core::util::{is_http_url, normalize_text_option};

use crate::cli::{ConfigCommands, ScopeModeArg};
use crate::config_file;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            scope_mode,
        } => run_config_init(supabase_url, supabase_anon_key, scope_mode),
        ConfigCommands::Show => run_config_show(),
    }
}

pub fn run_config_init(
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    scope_mode: Option<ScopeModeArg>,
) -> Result<(), CliError> {
    let existing =
        config_file::load_from_path(&config_file::default_config_path()).map_err(CliError::Config)?;

    // Explicit flags win over environment values over what is on disk.
    let merged_supabase_url = normalize_text_option(supabase_url)
        .or_else(|| normalize_text_option(env::var("WORDBOOK_SUPABASE_URL").ok()))
        .or(existing.supabase_url);
    let merged_supabase_anon_key = normalize_text_option(supabase_anon_key)
        .or_else(|| normalize_text_option(env::var("WORDBOOK_SUPABASE_ANON_KEY").ok()))
        .or(existing.supabase_anon_key);
    let merged_scope_mode = scope_mode.map_or(existing.scope_mode, ScopeMode::from);

    let config = CloudConfig {
        supabase_url: merged_supabase_url,
        supabase_anon_key: merged_supabase_anon_key,
        scope_mode: merged_scope_mode,
    };
    validate_config_urls(&config)?;

    let path = config_file::save(&config).map_err(CliError::Config)?;
    println!("Configuration saved to {}", path.display());

    let mut missing_fields = Vec::new();
    if config.supabase_url.is_none() {
        missing_fields.push("supabase_url");
    }
    if config.supabase_anon_key.is_none() {
        missing_fields.push("supabase_anon_key");
    }
    if missing_fields.is_empty() {
        match config.scope_mode {
            ScopeMode::User => println!(
                "Cloud sync is ready. Run `wordbook login --email <email> --password <password>`."
            ),
            ScopeMode::Device => {
                println!("Cloud sync is ready under this device's scope. Run `wordbook sync`.");
            }
        }
    } else {
        println!("Still missing: {}", missing_fields.join(", "));
    }

    Ok(())
}

fn run_config_show() -> Result<(), CliError> {
    let path = config_file::default_config_path();
    let config = config_file::load_from_path(&path).map_err(CliError::Config)?;

    println!("Config file: {}", path.display());
    println!(
        "supabase_url: {}",
        config.supabase_url.as_deref().unwrap_or("(unset)")
    );
    println!(
        "supabase_anon_key: {}",
        config
            .supabase_anon_key
            .as_deref()
            .map_or("(unset)", |_| "(set)")
    );
    println!("scope_mode: {}", config.scope_mode);
    Ok(())
}

fn validate_config_urls(config: &CloudConfig) -> Result<(), CliError> {
    if let Some(url) = config.supabase_url.as_deref() {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
