//! # price
//!
//! Resolves the price of one product.
//!
//! ## Rule Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  --rules FILE given?                                                    │
//! │    YES: JSON array of raw override rows (any naming convention),        │
//! │         or a legacy store dump holding a pricing collection.            │
//! │         No database is opened.                                          │
//! │    NO:  db.pricing_rules().list_for_product(P)                          │
//! │                                                                         │
//! │  Both feed the same resolver and print the fallback tier used.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Args;
use flama_core::legacy::{LegacyStore, PRICING_COLLECTION_KEYS};
use flama_core::{resolve, resolve_from_rows, PriceQuery, PriceResolution};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{read_input, Context};
use crate::error::{CliError, CliResult};

#[derive(Debug, Args)]
pub struct PriceArgs {
    /// Product id
    #[arg(long, short)]
    pub product: String,

    /// Deposit id; without it the lowest known price is used
    #[arg(long, short)]
    pub deposit: Option<String>,

    /// simple | exchange | full (troca, completa, cheio also accepted)
    #[arg(long, short, default_value = "simple")]
    pub mode: String,

    /// JSON file with override rows; no database is opened
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PriceView {
    product_id: String,
    deposit_id: Option<String>,
    mode: &'static str,
    price_cents: i64,
    price: String,
    source: &'static str,
}

pub async fn run(args: PriceArgs, ctx: &Context) -> CliResult<()> {
    let query = PriceQuery::from_raw(&args.product, args.deposit.as_deref(), &args.mode);
    if query.product_id.is_empty() {
        return Err(CliError::validation("product is required"));
    }

    let resolution: PriceResolution = match &args.rules {
        Some(path) => {
            let rows = read_rule_rows(path)?;
            debug!(rows = rows.len(), path = %path.display(), "Resolving from file");
            resolve_from_rows(&query, &rows)
        }
        None => {
            let db = ctx.open_db().await?;
            let rules = db.pricing_rules().list_for_product(&query.product_id).await?;
            db.close().await;
            resolve(&query, &rules)
        }
    };

    let view = PriceView {
        product_id: query.product_id.clone(),
        deposit_id: query.deposit_id.clone(),
        mode: query.mode.as_str(),
        price_cents: resolution.price.cents(),
        price: ctx.money(resolution.price.cents()),
        source: resolution.source.as_str(),
    };

    if ctx.json {
        return ctx.print_json(&view);
    }

    println!(
        "{} @ {} ({}): {}  [{}]",
        view.product_id,
        view.deposit_id.as_deref().unwrap_or("*"),
        view.mode,
        view.price,
        view.source
    );
    Ok(())
}

/// Raw rule rows from a JSON file: a bare array or a legacy store dump.
fn read_rule_rows(path: &Path) -> CliResult<Vec<Value>> {
    let raw = read_input(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::input(format!("{} is not valid JSON: {}", path.display(), e)))?;

    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(_) => {
            let store = LegacyStore::from_json_str(&raw)?;
            Ok(store.collection(PRICING_COLLECTION_KEYS))
        }
        _ => Err(CliError::input(format!(
            "{} must hold an array of rules or a store dump",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_bare_array() {
        let file = write_temp(r#"[{"product_id": "P13", "price": 110}]"#);
        let rows = read_rule_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_reads_store_dump() {
        let file = write_temp(r#"{"precos": "[{\"produto_id\":\"P13\",\"preco\":110}]", "theme": "dark"}"#);
        let rows = read_rule_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_rejects_scalars_and_garbage() {
        let file = write_temp("42");
        assert!(read_rule_rows(file.path()).is_err());

        let file = write_temp("not json");
        let err = read_rule_rows(file.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InputError);
    }
}
