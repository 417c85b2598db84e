//! # Flama CLI Library
//!
//! Operator command line for Flama ERP. `main.rs` only parses arguments
//! and maps errors to exit codes; everything else lives here.
//!
//! ## Module Organization
//! ```text
//! flama_cli/
//! ├── lib.rs          ◄─── You are here (Cli parser, startup, logging)
//! ├── config.rs       ◄─── ConfigState (.env + FLAMA_* variables)
//! ├── error.rs        ◄─── CliError and exit codes
//! └── commands/
//!     ├── mod.rs      ◄─── Command enum, Context, dispatch
//!     ├── price.rs    ◄─── price resolution (DB or JSON file)
//!     ├── catalog.rs  ◄─── deposits, products, clients
//!     ├── rules.rs    ◄─── pricing overrides
//!     ├── orders.rs   ◄─── order creation and status
//!     └── legacy.rs   ◄─── legacy offline store tools
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. dotenvy loads .env (if present)                                     │
//! │  2. ConfigState::from_env() ← FLAMA_* overrides                         │
//! │  3. --db flag overrides the database path                               │
//! │  4. tracing-subscriber (RUST_LOG, then FLAMA_LOG, then default)         │
//! │  5. Command runs; the database is opened only if it needs one           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{Command, Context};
use config::ConfigState;
use error::{CliError, CliResult, ErrorCode};

/// Flama ERP back office.
#[derive(Debug, Parser)]
#[command(name = "flama", version, about = "Flama ERP: gas distribution back office")]
pub struct Cli {
    /// SQLite database file (overrides FLAMA_DATABASE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Loads configuration, initializes logging and runs the command.
pub async fn run(cli: Cli) -> CliResult<()> {
    let mut config = ConfigState::from_env()
        .map_err(|e| CliError::new(ErrorCode::ConfigError, e.to_string()))?;

    if let Some(db) = cli.db {
        config.database_path = db;
    }

    init_tracing(&config.log_filter);
    debug!(database = %config.database_path.display(), "Configuration loaded");

    let ctx = Context::new(config, cli.json);
    commands::execute(cli.command, &ctx).await
}

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=flama_db=trace` - Trace the database layer only
/// - Otherwise `FLAMA_LOG`, then `info,flama=debug,sqlx=warn`
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second init (tests calling run twice) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
