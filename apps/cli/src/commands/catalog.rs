//! # Catalog Commands
//!
//! Listing of deposits, products and clients.

use clap::Subcommand;
use flama_core::validation::validate_search_query;
use flama_core::{Client, Deposit, Product};
use serde::Serialize;

use super::Context;
use crate::error::CliResult;

#[derive(Debug, Subcommand)]
pub enum DepositsCommand {
    /// List active deposits
    List,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List or search active products
    List {
        /// Matches name or unit (case-insensitive) or the exact id
        #[arg(long, short)]
        query: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List or search active clients
    List {
        /// Matches name, phone or CPF/CNPJ digits
        #[arg(long, short)]
        query: Option<String>,
    },
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DepositDto {
    id: String,
    name: String,
    address: Option<String>,
    phone: Option<String>,
}

impl From<Deposit> for DepositDto {
    fn from(d: Deposit) -> Self {
        DepositDto {
            id: d.id,
            name: d.name,
            address: d.address,
            phone: d.phone,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductDto {
    id: String,
    name: String,
    unit: Option<String>,
    description: Option<String>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            name: p.name,
            unit: p.unit,
            description: p.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientDto {
    id: String,
    name: String,
    document: Option<String>,
    phone: Option<String>,
}

impl From<Client> for ClientDto {
    fn from(c: Client) -> Self {
        ClientDto {
            id: c.id,
            name: c.name,
            document: c.document,
            phone: c.phone,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn run_deposits(cmd: DepositsCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        DepositsCommand::List => {
            let db = ctx.open_db().await?;
            let deposits: Vec<DepositDto> = db
                .deposits()
                .list_active()
                .await?
                .into_iter()
                .map(DepositDto::from)
                .collect();
            db.close().await;

            if ctx.json {
                return ctx.print_json(&deposits);
            }
            if deposits.is_empty() {
                println!("No deposits");
            }
            for d in &deposits {
                println!("{:<16} {}", d.id, d.name);
            }
            Ok(())
        }
    }
}

pub async fn run_products(cmd: ProductsCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        ProductsCommand::List { query } => {
            let query = validate_search_query(query.as_deref().unwrap_or(""))?;

            let db = ctx.open_db().await?;
            let products: Vec<ProductDto> = db
                .products()
                .search(&query, ctx.config.search_limit)
                .await?
                .into_iter()
                .map(ProductDto::from)
                .collect();
            db.close().await;

            if ctx.json {
                return ctx.print_json(&products);
            }
            if products.is_empty() {
                println!("No products");
            }
            for p in &products {
                println!(
                    "{:<16} {:<6} {}",
                    p.id,
                    p.unit.as_deref().unwrap_or("-"),
                    p.name
                );
            }
            Ok(())
        }
    }
}

pub async fn run_clients(cmd: ClientsCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        ClientsCommand::List { query } => {
            let query = validate_search_query(query.as_deref().unwrap_or(""))?;

            let db = ctx.open_db().await?;
            let clients: Vec<ClientDto> = db
                .clients()
                .search(&query, ctx.config.search_limit)
                .await?
                .into_iter()
                .map(ClientDto::from)
                .collect();
            db.close().await;

            if ctx.json {
                return ctx.print_json(&clients);
            }
            if clients.is_empty() {
                println!("No clients");
            }
            for c in &clients {
                println!(
                    "{:<16} {:<15} {}",
                    c.id,
                    c.document.as_deref().unwrap_or("-"),
                    c.name
                );
            }
            Ok(())
        }
    }
}
