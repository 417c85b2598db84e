//! # Legacy Store Commands
//!
//! Tools for the browser-cache dumps the old front-end kept offline.
//!
//! ```text
//! purge-queue FILE      strip the retired offline sync queue, rewrite FILE
//! purge-queue FILE -n   list what would be removed, FILE untouched
//! import FILE           normalize every collection into the database
//! ```

use clap::Subcommand;
use flama_core::legacy::{CollectionReport, LegacyStore};
use flama_db::DbError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{read_input, Context};
use crate::error::{CliError, CliResult};

#[derive(Debug, Subcommand)]
pub enum LegacyCommand {
    /// Remove the retired offline sync queue from a dump
    PurgeQueue {
        /// Dump file (JSON object)
        file: PathBuf,

        /// Only list the keys that would be removed
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// Import deposits, products, clients and overrides from a dump
    Import {
        /// Dump file (JSON object)
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurgeView {
    removed: Vec<String>,
    dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportView {
    collections: Vec<CollectionReport>,
    imported: usize,
    skipped: usize,
}

pub async fn run(cmd: LegacyCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        LegacyCommand::PurgeQueue { file, dry_run } => purge_queue(&file, dry_run, ctx),
        LegacyCommand::Import { file } => import(&file, ctx).await,
    }
}

fn load(path: &Path) -> CliResult<LegacyStore> {
    let raw = read_input(path)?;
    Ok(LegacyStore::from_json_str(&raw)?)
}

fn purge_queue(path: &Path, dry_run: bool, ctx: &Context) -> CliResult<()> {
    let mut store = load(path)?;

    let removed = if dry_run {
        store.offline_queue_keys()
    } else {
        let removed = store.purge_offline_queue();
        if !removed.is_empty() {
            let body = store.to_json_string_pretty()?;
            std::fs::write(path, body)
                .map_err(|e| CliError::input(format!("cannot write {}: {}", path.display(), e)))?;
        }
        removed
    };

    info!(file = %path.display(), removed = removed.len(), dry_run, "Offline queue purge");

    if ctx.json {
        return ctx.print_json(&PurgeView { removed, dry_run });
    }

    if removed.is_empty() {
        println!("No offline queue keys in {}", path.display());
        return Ok(());
    }
    let verb = if dry_run { "Would remove" } else { "Removed" };
    println!("{} {} key(s):", verb, removed.len());
    for key in &removed {
        println!("  {}", key);
    }
    Ok(())
}

async fn import(path: &Path, ctx: &Context) -> CliResult<()> {
    let store = load(path)?;
    let extract = store.extract();
    let mut reports = extract.reports.clone();

    let db = ctx.open_db().await?;

    // Parents first: overrides reference deposits and products
    let mut failed = [0usize; 4];
    for deposit in &extract.deposits {
        record(&mut failed[0], "deposit", &deposit.id, db.deposits().upsert(deposit).await)?;
    }
    for product in &extract.products {
        record(&mut failed[1], "product", &product.id, db.products().upsert(product).await)?;
    }
    for client in &extract.clients {
        record(&mut failed[2], "client", &client.id, db.clients().upsert(client).await)?;
    }
    for rule in &extract.pricing_rules {
        let outcome = db.pricing_rules().upsert(rule).await.map(|_| ());
        record(&mut failed[3], "pricing rule", &rule.product_id, outcome)?;
    }

    db.close().await;

    for (report, failed) in reports.iter_mut().zip(failed) {
        report.imported -= failed;
        report.skipped += failed;
    }

    let view = ImportView {
        imported: reports.iter().map(|r| r.imported).sum(),
        skipped: reports.iter().map(|r| r.skipped).sum(),
        collections: reports,
    };

    info!(imported = view.imported, skipped = view.skipped, "Legacy import finished");

    if ctx.json {
        return ctx.print_json(&view);
    }
    for r in &view.collections {
        println!(
            "{:<14} imported {:>5}  skipped {:>5}",
            r.collection, r.imported, r.skipped
        );
    }
    println!(
        "{:<14} imported {:>5}  skipped {:>5}",
        "total", view.imported, view.skipped
    );
    Ok(())
}

/// Counts a record the database refused. Constraint failures skip the
/// record; anything else aborts the import.
fn record(
    failed: &mut usize,
    entity: &str,
    id: &str,
    outcome: Result<(), DbError>,
) -> CliResult<()> {
    match outcome {
        Err(err) if err.is_constraint() => {
            warn!(entity, id, error = %err, "Skipping legacy record");
            *failed += 1;
            Ok(())
        }
        other => Ok(other?),
    }
}
