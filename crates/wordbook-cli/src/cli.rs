use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wordbook_core::config::ScopeMode;

#[derive(Parser)]
#[command(name = "wordbook")]
#[command(about = "Keep a personal vocabulary notebook from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: wordbook <word> [description...]
    #[arg(trailing_var_arg = true)]
    pub entry: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a word with its meaning
    #[command(alias = "new")]
    Add {
        /// The word or phrase to record
        word: String,
        /// Meaning, translation or usage notes (stdin or $EDITOR when omitted)
        description: Vec<String>,
        /// When a similar word exists, edit that entry instead of adding
        #[arg(long, conflicts_with = "force")]
        update: bool,
        /// Add a new entry even when a similar word exists
        #[arg(long)]
        force: bool,
    },
    /// List recent entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Filter by word or description
        #[arg(short, long, value_name = "TERM")]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing entry
    Edit {
        /// Entry ID as shown by `wordbook list`
        id: String,
        /// Replacement word (unchanged when omitted)
        #[arg(long, value_name = "WORD")]
        word: Option<String>,
        /// Replacement description (opens $EDITOR when both are omitted)
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,
    },
    /// Delete an existing entry
    Delete {
        /// Entry ID as shown by `wordbook list`
        id: String,
    },
    /// Push local changes and merge remote ones
    Sync,
    /// Show cloud configuration and sync state
    Status,
    /// Sign in with email/password and sync the notebook
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Configure the cloud backend
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the cloud configuration
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Row ownership: user accounts or this device only
        #[arg(long, value_enum, value_name = "MODE")]
        scope_mode: Option<ScopeModeArg>,
    },
    /// Print the current configuration
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScopeModeArg {
    User,
    Device,
}

impl From<ScopeModeArg> for ScopeMode {
    fn from(value: ScopeModeArg) -> Self {
        match value {
            ScopeModeArg::User => Self::User,
            ScopeModeArg::Device => Self::Device,
        }
    }
}
