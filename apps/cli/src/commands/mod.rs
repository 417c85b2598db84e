//! # Commands
//!
//! One module per command group. Every command takes the shared
//! [`Context`] and returns a [`CliResult`].
//!
//! ## Command Tree
//! ```text
//! flama
//! ├── price --product P [--deposit D] [--mode M] [--rules FILE]
//! ├── deposits list
//! ├── products list [--query Q]
//! ├── clients list [--query Q]
//! ├── rules list | set | delete
//! ├── orders create | show | status | list
//! ├── legacy purge-queue | import
//! └── migrate
//! ```

pub mod catalog;
pub mod legacy;
pub mod orders;
pub mod price;
pub mod rules;

use clap::Subcommand;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::config::ConfigState;
use crate::error::{CliError, CliResult};
use flama_db::{Database, DbConfig};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the price of a product
    Price(price::PriceArgs),

    /// Deposits (stock and sales locations)
    #[command(subcommand)]
    Deposits(catalog::DepositsCommand),

    /// Product catalog
    #[command(subcommand)]
    Products(catalog::ProductsCommand),

    /// Clients
    #[command(subcommand)]
    Clients(catalog::ClientsCommand),

    /// Pricing overrides
    #[command(subcommand)]
    Rules(rules::RulesCommand),

    /// Orders
    #[command(subcommand)]
    Orders(orders::OrdersCommand),

    /// Legacy offline store tools
    #[command(subcommand)]
    Legacy(legacy::LegacyCommand),

    /// Apply pending database migrations
    Migrate,
}

/// Runs a parsed command.
pub async fn execute(command: Command, ctx: &Context) -> CliResult<()> {
    match command {
        Command::Price(args) => price::run(args, ctx).await,
        Command::Deposits(cmd) => catalog::run_deposits(cmd, ctx).await,
        Command::Products(cmd) => catalog::run_products(cmd, ctx).await,
        Command::Clients(cmd) => catalog::run_clients(cmd, ctx).await,
        Command::Rules(cmd) => rules::run(cmd, ctx).await,
        Command::Orders(cmd) => orders::run(cmd, ctx).await,
        Command::Legacy(cmd) => legacy::run(cmd, ctx).await,
        Command::Migrate => migrate(ctx).await,
    }
}

// =============================================================================
// Context
// =============================================================================

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ConfigState,
    /// Print JSON instead of text.
    pub json: bool,
}

impl Context {
    pub fn new(config: ConfigState, json: bool) -> Self {
        Context { config, json }
    }

    /// Opens the configured database, applying pending migrations.
    pub async fn open_db(&self) -> CliResult<Database> {
        self.connect(true).await
    }

    async fn connect(&self, run_migrations: bool) -> CliResult<Database> {
        let path = &self.config.database_path;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::input(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        info!(path = %path.display(), "Opening database");
        let config = DbConfig::new(path).run_migrations(run_migrations);
        Ok(Database::new(config).await?)
    }

    /// Formats centavos with the configured currency.
    pub fn money(&self, cents: i64) -> String {
        self.config.format_currency(cents)
    }

    /// Prints `value` as pretty JSON on stdout.
    pub fn print_json<T: Serialize>(&self, value: &T) -> CliResult<()> {
        let body = serde_json::to_string_pretty(value)
            .map_err(|e| CliError::internal(format!("cannot serialize output: {}", e)))?;
        println!("{}", body);
        Ok(())
    }
}

/// Reads a UTF-8 input file.
pub(crate) fn read_input(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::input(format!("cannot read {}: {}", path.display(), e)))
}

// =============================================================================
// migrate
// =============================================================================

#[derive(Debug, Serialize)]
struct MigrationView {
    total: usize,
    applied_before: usize,
    applied_now: usize,
}

async fn migrate(ctx: &Context) -> CliResult<()> {
    let db = ctx.connect(false).await?;

    let (total, applied_before) = db.migration_status().await?;
    db.run_migrations().await?;
    let (_, applied_now) = db.migration_status().await?;
    db.close().await;

    let view = MigrationView {
        total,
        applied_before,
        applied_now,
    };

    if ctx.json {
        return ctx.print_json(&view);
    }

    let newly = view.applied_now.saturating_sub(view.applied_before);
    if newly == 0 {
        println!("Database is up to date ({} migrations)", view.total);
    } else {
        println!("Applied {} migration(s), {}/{} now applied", newly, view.applied_now, view.total);
    }
    Ok(())
}
