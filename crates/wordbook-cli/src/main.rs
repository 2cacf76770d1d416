//! Wordbook CLI - a personal vocabulary notebook in the terminal
//!
//! Every command works against the on-device store first; cloud sync is
//! best-effort and only runs when a backend is configured.

mod auth;
mod cli;
mod commands;
mod config_file;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wordbook_core=info".parse().unwrap())
                .add_directive("wordbook_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = commands::common::resolve_db_path(cli.db_path);

    match cli.command {
        Some(Commands::Add {
            word,
            description,
            update,
            force,
        }) => {
            commands::add::run_add(&word, &description, update, force, &db_path).await?;
        }
        Some(Commands::List {
            limit,
            search,
            json,
        }) => {
            commands::list::run_list(limit, search.as_deref(), json, &db_path)?;
        }
        Some(Commands::Edit {
            id,
            word,
            description,
        }) => {
            commands::edit::run_edit(&id, word.as_deref(), description.as_deref(), &db_path)
                .await?;
        }
        Some(Commands::Delete { id }) => commands::delete::run_delete(&id, &db_path).await?,
        Some(Commands::Sync) => commands::sync::run_sync(&db_path).await?,
        Some(Commands::Status) => commands::status_cmd::run_status(&db_path).await?,
        Some(Commands::Login { email, password }) => {
            commands::auth_cmd::run_login(&email, &password, &db_path).await?;
        }
        Some(Commands::Signup { email, password }) => {
            commands::auth_cmd::run_signup(&email, &password).await?;
        }
        Some(Commands::Logout) => commands::auth_cmd::run_logout().await?,
        Some(Commands::Whoami) => commands::auth_cmd::run_whoami().await?,
        Some(Commands::Config { command }) => commands::config::run_config(command)?,
        Some(Commands::Completions { shell, output }) => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
        None => {
            // Quick capture mode: wordbook <word> [description...]
            if let Some((word, description_parts)) = cli.entry.split_first() {
                commands::add::run_add(word, description_parts, false, false, &db_path).await?;
            } else {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            }
        }
    }

    Ok(())
}
