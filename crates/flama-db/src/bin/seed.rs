//! # Seed Data
//!
//! Populates a database with a small gas-distribution catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p flama-db --bin seed
//!
//! # Specify database path
//! cargo run -p flama-db --bin seed -- --db ./data/flama.db
//! ```
//!
//! ## Generated Data
//! - Two deposits (`centro`, `norte`)
//! - Cylinders P13, P20, P45 and a 20L water jug
//! - Global prices per mode, plus cheaper overrides at `norte`

use chrono::Utc;
use flama_core::{resolve, Deposit, Money, PriceQuery, PricingMode, PricingRule, Product};
use flama_db::Database;
use std::env;

const DEPOSITS: &[(&str, &str, &str)] = &[
    ("centro", "Depósito Centro", "Rua Principal, 100"),
    ("norte", "Depósito Norte", "Av. Norte, 2500"),
];

/// (id, name, unit, simple, exchange, full) prices in centavos.
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("P13", "Botijão de gás P13", "P13", 11500, 10500, 32000),
    ("P20", "Cilindro P20 (empilhadeira)", "P20", 19000, 17500, 48000),
    ("P45", "Cilindro P45", "P45", 42000, 39000, 98000),
    ("AGUA20", "Água mineral 20L", "20L", 1500, 1200, 3500),
];

/// Discount applied at `norte`, in centavos.
const NORTE_DISCOUNT: i64 = 500;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./flama_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Flama ERP Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./flama_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Flama ERP Seed Data");
    println!("======================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::open(std::path::Path::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (id, name, address) in DEPOSITS {
        db.deposits()
            .upsert(&Deposit {
                id: id.to_string(),
                name: name.to_string(),
                address: Some(address.to_string()),
                phone: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ {} deposits", DEPOSITS.len());

    let mut rules = 0;
    for (id, name, unit, simple, exchange, full) in PRODUCTS {
        db.products()
            .upsert(&Product {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                unit: Some(unit.to_string()),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        let global = [
            PricingRule::simple(*id, None, Money::from_cents(*simple)),
            PricingRule::exchange(*id, None, Money::from_cents(*exchange)),
            PricingRule::full(*id, None, Money::from_cents(*full)),
        ];
        let norte = [
            PricingRule::simple(*id, Some("norte"), Money::from_cents(simple - NORTE_DISCOUNT)),
            PricingRule::exchange(*id, Some("norte"), Money::from_cents(exchange - NORTE_DISCOUNT)),
        ];

        for rule in global.iter().chain(norte.iter()) {
            db.pricing_rules().upsert(rule).await?;
            rules += 1;
        }
    }
    println!("✓ {} products", PRODUCTS.len());
    println!("✓ {} pricing rules", rules);

    println!();
    println!("Sample prices (P13):");
    let p13_rules = db.pricing_rules().list_for_product("P13").await?;
    for (deposit, label) in [(Some("centro"), "centro"), (Some("norte"), "norte"), (None, "-")] {
        for mode in PricingMode::ALL {
            let query = PriceQuery::new("P13", deposit, mode);
            let resolution = resolve(&query, &p13_rules);
            println!(
                "  {:<7} {:<9} {:>10}  ({})",
                label,
                mode.as_str(),
                resolution.price.to_string(),
                resolution.source.as_str()
            );
        }
    }

    db.close().await;

    println!();
    println!("🎉 Seed complete!");

    Ok(())
}
