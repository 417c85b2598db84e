//! # Pricing Rule Commands
//!
//! Lists and edits the overrides the resolver reads.
//!
//! ```text
//! flama rules set --product P13 --deposit norte --mode troca --exchange-price 95,00
//!                          │            │              │               │
//!                          └── key ─────┴──────────────┘               └── reais
//! ```
//!
//! Prices are typed in reais (`110`, `110,50`, `1.234,56`, `R$ 95`). Zero
//! and negative prices are stored as given.

use clap::{Args, Subcommand};
use flama_core::validation::validate_id;
use flama_core::{Money, PricingMode, PricingRule};
use flama_db::RuleWrite;
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::error::{CliError, CliResult};

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List the overrides of a product
    List {
        #[arg(long, short)]
        product: String,
    },

    /// Create or replace an override
    Set(SetArgs),

    /// Delete an override
    Delete {
        #[arg(long, short)]
        product: String,

        /// Omit for the global override
        #[arg(long, short)]
        deposit: Option<String>,

        #[arg(long, short, value_parser = parse_mode)]
        mode: PricingMode,
    },
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(long, short)]
    pub product: String,

    /// Omit for a global override
    #[arg(long, short)]
    pub deposit: Option<String>,

    /// simple | exchange | full (simples, troca, completa, cheio)
    #[arg(long, short, value_parser = parse_mode)]
    pub mode: PricingMode,

    /// Base price in reais, `110,50` or `110.50` (`1.500` is refused as ambiguous)
    #[arg(long, value_parser = parse_money, allow_hyphen_values = true)]
    pub price: Option<Money>,

    /// Exchange price in reais, `110,50` or `110.50` (`1.500` is refused as ambiguous)
    #[arg(long, value_parser = parse_money, allow_hyphen_values = true)]
    pub exchange_price: Option<Money>,

    /// Full price in reais, `110,50` or `110.50` (`1.500` is refused as ambiguous)
    #[arg(long, value_parser = parse_money, allow_hyphen_values = true)]
    pub full_price: Option<Money>,
}

/// Mode names accepted on writes. Reads fall back to simple on anything
/// else; writes refuse it.
fn parse_mode(raw: &str) -> Result<PricingMode, String> {
    let known = [
        "simple", "simples", "exchange", "troca", "full", "completa", "completo", "cheio",
    ];
    let lowered = raw.trim().to_lowercase();
    if known.contains(&lowered.as_str()) {
        Ok(PricingMode::normalize(&lowered))
    } else {
        Err(format!("unknown mode '{}' (expected simple, exchange or full)", raw))
    }
}

fn parse_money(raw: &str) -> Result<Money, String> {
    Money::parse(raw).ok_or_else(|| {
        format!("'{}' is not an amount in reais (write thousands as 1500 or 1.500,00)", raw)
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleDto {
    product_id: String,
    deposit_id: Option<String>,
    mode: &'static str,
    price_cents: Option<i64>,
    exchange_price_cents: Option<i64>,
    full_price_cents: Option<i64>,
}

impl From<&PricingRule> for RuleDto {
    fn from(r: &PricingRule) -> Self {
        RuleDto {
            product_id: r.product_id.clone(),
            deposit_id: r.deposit_id.clone(),
            mode: r.mode.as_str(),
            price_cents: r.price.map(|m| m.cents()),
            exchange_price_cents: r.exchange_price.map(|m| m.cents()),
            full_price_cents: r.full_price.map(|m| m.cents()),
        }
    }
}

pub async fn run(cmd: RulesCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        RulesCommand::List { product } => list(&product, ctx).await,
        RulesCommand::Set(args) => set(args, ctx).await,
        RulesCommand::Delete {
            product,
            deposit,
            mode,
        } => delete(&product, deposit.as_deref(), mode, ctx).await,
    }
}

async fn list(product: &str, ctx: &Context) -> CliResult<()> {
    let product = validate_id("product", product)?;

    let db = ctx.open_db().await?;
    let rules = db.pricing_rules().list_for_product(&product).await?;
    db.close().await;

    if ctx.json {
        let dtos: Vec<RuleDto> = rules.iter().map(RuleDto::from).collect();
        return ctx.print_json(&dtos);
    }

    if rules.is_empty() {
        println!("No overrides for {}", product);
        return Ok(());
    }

    let cell = |m: Option<Money>| {
        m.map(|m| ctx.money(m.cents()))
            .unwrap_or_else(|| "-".to_string())
    };
    println!(
        "{:<16} {:<9} {:>12} {:>12} {:>12}",
        "deposit", "mode", "price", "exchange", "full"
    );
    for rule in &rules {
        println!(
            "{:<16} {:<9} {:>12} {:>12} {:>12}",
            rule.deposit_id.as_deref().unwrap_or("*"),
            rule.mode.as_str(),
            cell(rule.price),
            cell(rule.exchange_price),
            cell(rule.full_price)
        );
    }
    Ok(())
}

async fn set(args: SetArgs, ctx: &Context) -> CliResult<()> {
    if args.price.is_none() && args.exchange_price.is_none() && args.full_price.is_none() {
        return Err(CliError::validation(
            "give at least one of --price, --exchange-price, --full-price",
        ));
    }

    let product = validate_id("product", &args.product)?;
    let deposit = args
        .deposit
        .as_deref()
        .map(|d| validate_id("deposit", d))
        .transpose()?;

    let rule = PricingRule {
        product_id: product,
        deposit_id: deposit,
        mode: args.mode,
        price: args.price,
        exchange_price: args.exchange_price,
        full_price: args.full_price,
    };

    let db = ctx.open_db().await?;
    let outcome = db.pricing_rules().upsert(&rule).await?;
    db.close().await;

    info!(
        product_id = %rule.product_id,
        deposit_id = ?rule.deposit_id,
        mode = %rule.mode,
        ?outcome,
        "Override saved"
    );

    if ctx.json {
        return ctx.print_json(&RuleDto::from(&rule));
    }

    let verb = match outcome {
        RuleWrite::Created => "Created",
        RuleWrite::Updated => "Updated",
    };
    println!(
        "{} {} override for {} at {}",
        verb,
        rule.mode,
        rule.product_id,
        rule.deposit_id.as_deref().unwrap_or("all deposits")
    );
    Ok(())
}

async fn delete(
    product: &str,
    deposit: Option<&str>,
    mode: PricingMode,
    ctx: &Context,
) -> CliResult<()> {
    let product = validate_id("product", product)?;

    let db = ctx.open_db().await?;
    db.pricing_rules().delete(&product, deposit, mode).await?;
    db.close().await;

    if !ctx.json {
        println!(
            "Deleted {} override for {} at {}",
            mode,
            product,
            deposit.unwrap_or("all deposits")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_accepts_aliases() {
        assert_eq!(parse_mode("Troca").unwrap(), PricingMode::Exchange);
        assert_eq!(parse_mode("cheio").unwrap(), PricingMode::Full);
        assert_eq!(parse_mode(" simples ").unwrap(), PricingMode::Simple);
        assert!(parse_mode("atacado").is_err());
    }

    #[test]
    fn test_parse_money_in_reais() {
        assert_eq!(parse_money("110").unwrap().cents(), 11000);
        assert_eq!(parse_money("95,50").unwrap().cents(), 9550);
        assert_eq!(parse_money("-5").unwrap().cents(), -500);
        assert!(parse_money("abc").is_err());
    }
}
