//! Karma CLI - operator interface for a karma ledger
//!
//! This CLI lets operators:
//! - Replay a chat message through the engine, self-bump rules included
//! - Look up or correct a single subject's score
//! - Show the user and topic leaderboards
//! - Inspect the resolved configuration

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{leaderboard, process, resolve_subject_key, score};
use config::KarmaConfig;
use error::CliResult;
use karma_engine::{KarmaEngine, Ledger};

/// Karma CLI application
#[derive(Parser)]
#[command(name = "karma")]
#[command(about = "Karma - chat reputation ledger CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "KARMA_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger snapshot file
    #[arg(short, long, env = "KARMA_FILE_PATH")]
    ledger: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a chat message through the karma engine
    Process {
        /// Platform id of the message author
        #[arg(short, long)]
        author: String,

        /// Raw message text
        text: String,
    },

    /// Show the score for one subject
    Get {
        /// Topic text, or a platform reference such as <@U123>
        subject: String,

        /// Treat the subject as a bare platform user id
        #[arg(short, long)]
        user: bool,
    },

    /// Adjust a subject's score directly
    Bump {
        /// Topic text, or a platform reference such as <@U123>
        subject: String,

        /// Treat the subject as a bare platform user id
        #[arg(short, long)]
        user: bool,

        /// Decrement instead of increment
        #[arg(short, long)]
        down: bool,
    },

    /// Show top users and topics
    #[command(alias = "top")]
    Leaderboard {
        /// Rows per list (0 shows everything)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show resolved configuration
    Config,
}

/// Configuration as the CLI resolved it
#[derive(Debug, Serialize)]
struct ResolvedConfig {
    config_file: Option<PathBuf>,
    ledger_path: PathBuf,
    leaderboard_limit: usize,
}

fn main() {
    if let Err(e) = run() {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    // Load config
    let config = KarmaConfig::load(cli.config.as_deref())?;
    let ledger_path = config.resolve_ledger_path(cli.ledger.as_deref());

    // Execute command
    match cli.command {
        Commands::Process { author, text } => {
            let engine = KarmaEngine::new(Arc::new(Ledger::open(&ledger_path)?));
            process::execute(&engine, &author, &text, cli.output)
        }
        Commands::Get { subject, user } => {
            let subject_key = resolve_subject_key(&subject, user)?;
            score::get(&Ledger::open(&ledger_path)?, subject_key, cli.output)
        }
        Commands::Bump { subject, user, down } => {
            let subject_key = resolve_subject_key(&subject, user)?;
            score::bump(&Ledger::open(&ledger_path)?, subject_key, down, cli.output)
        }
        Commands::Leaderboard { limit } => {
            let limit = config.resolve_leaderboard_limit(limit);
            leaderboard::execute(&Ledger::open(&ledger_path)?, limit, cli.output)
        }
        Commands::Config => {
            let config_file = match cli.config {
                Some(path) => Some(path),
                None => KarmaConfig::default_config_path().ok(),
            };
            let resolved = ResolvedConfig {
                config_file,
                ledger_path,
                leaderboard_limit: config.resolve_leaderboard_limit(None),
            };
            match cli.output {
                output::OutputFormat::Table => {
                    let config_file = resolved
                        .config_file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(none)".to_string());
                    output::print_info(&format!("Config file: {}", config_file));
                    output::print_info(&format!("Ledger: {}", resolved.ledger_path.display()));
                    output::print_info(&format!("Leaderboard limit: {}", resolved.leaderboard_limit));
                    Ok(())
                }
                format => output::print_single(&resolved, format),
            }
        }
    }
}
