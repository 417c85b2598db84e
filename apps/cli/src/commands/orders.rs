//! # Order Commands
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  flama orders create --deposit norte --mode troca --item P13:2          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products().get_by_id(P13)          ← unknown id → NOT_FOUND            │
//! │  pricing_rules().list_for_products  ← one query for every line          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderDraft::add_product            ← price resolved and frozen         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  orders().insert(order, items)      ← one transaction                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines with no applicable override go in at R$0,00 and are reported as
//! warnings, never silently.

use clap::{Args, Subcommand};
use flama_core::order::OrderDraft;
use flama_core::validation::{validate_id, validate_uuid};
use flama_core::{CoreError, Order, OrderItem, OrderStatus, PricingMode};
use serde::Serialize;
use std::str::FromStr;
use tracing::{info, warn};

use super::Context;
use crate::error::CliResult;

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// Price and store a new order
    Create(CreateArgs),

    /// Show an order and its items
    Show {
        /// Order id
        id: String,
    },

    /// Mark an order delivered or cancelled
    Status {
        /// Order id
        id: String,

        /// delivered | cancelled (entregue, cancelado)
        #[arg(value_parser = OrderStatus::from_str)]
        status: OrderStatus,
    },

    /// List the most recent orders
    List,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Deposit the order is placed at
    #[arg(long, short)]
    pub deposit: String,

    /// simple | exchange | full (unknown names price as simple)
    #[arg(long, short, default_value = "simple")]
    pub mode: String,

    /// Client id
    #[arg(long, short)]
    pub client: Option<String>,

    /// Free text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Line as PRODUCT:QTY; repeat for more lines
    #[arg(
        long = "item",
        short = 'i',
        value_name = "PRODUCT:QTY",
        value_parser = parse_item,
        required = true
    )]
    pub items: Vec<ItemSpec>,
}

/// A `PRODUCT:QTY` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub product_id: String,
    pub quantity: i64,
}

fn parse_item(raw: &str) -> Result<ItemSpec, String> {
    let (product, qty) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is not PRODUCT:QTY", raw))?;

    let product_id = product.trim();
    if product_id.is_empty() {
        return Err(format!("'{}' has no product", raw));
    }

    let quantity = qty
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("'{}' is not a whole quantity", qty))?;

    Ok(ItemSpec {
        product_id: product_id.to_string(),
        quantity,
    })
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDto {
    id: String,
    deposit_id: Option<String>,
    client_id: Option<String>,
    mode: &'static str,
    status: &'static str,
    total_cents: i64,
    notes: Option<String>,
    created_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    items: Vec<OrderItemDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemDto {
    product_id: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

impl OrderDto {
    fn new(order: Order, items: Vec<OrderItem>) -> Self {
        OrderDto {
            id: order.id,
            deposit_id: order.deposit_id,
            client_id: order.client_id,
            mode: order.mode.as_str(),
            status: order.status.as_str(),
            total_cents: order.total_cents,
            notes: order.notes,
            created_at: order.created_at.to_rfc3339(),
            items: items
                .into_iter()
                .map(|i| OrderItemDto {
                    product_id: i.product_id,
                    name: i.name_snapshot,
                    quantity: i.quantity,
                    unit_price_cents: i.unit_price_cents,
                    line_total_cents: i.line_total_cents,
                })
                .collect(),
        }
    }

    fn print(&self, ctx: &Context) {
        println!("Order {}", self.id);
        println!("  status:  {}", self.status);
        println!("  mode:    {}", self.mode);
        println!("  deposit: {}", self.deposit_id.as_deref().unwrap_or("-"));
        if let Some(client) = &self.client_id {
            println!("  client:  {}", client);
        }
        if let Some(notes) = &self.notes {
            println!("  notes:   {}", notes);
        }
        for item in &self.items {
            println!(
                "  {:>4} x {:<32} {:>12} {:>12}",
                item.quantity,
                item.name,
                ctx.money(item.unit_price_cents),
                ctx.money(item.line_total_cents)
            );
        }
        println!("  total:   {}", ctx.money(self.total_cents));
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn run(cmd: OrdersCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        OrdersCommand::Create(args) => create(args, ctx).await,
        OrdersCommand::Show { id } => show(&id, ctx).await,
        OrdersCommand::Status { id, status } => change_status(&id, status, ctx).await,
        OrdersCommand::List => list(ctx).await,
    }
}

async fn create(args: CreateArgs, ctx: &Context) -> CliResult<()> {
    let deposit = validate_id("deposit", &args.deposit)?;
    let client = args
        .client
        .as_deref()
        .map(|c| validate_id("client", c))
        .transpose()?;

    let db = ctx.open_db().await?;

    let mut products = Vec::with_capacity(args.items.len());
    for item in &args.items {
        let product = db
            .products()
            .get_by_id(&item.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
        products.push(product);
    }

    let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
    let rules = db.pricing_rules().list_for_products(&ids).await?;

    let mut draft = OrderDraft::new(Some(deposit.as_str()), PricingMode::normalize(&args.mode));
    if let Some(client) = client {
        draft = draft.with_client(client);
    }
    if let Some(notes) = args.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        draft = draft.with_notes(notes);
    }

    for (product, item) in products.iter().zip(&args.items) {
        draft.add_product(product, item.quantity, &rules)?;
    }

    for line in draft.unpriced_lines() {
        warn!(
            product_id = %line.product_id,
            deposit = %deposit,
            mode = %draft.mode,
            "No price override applies, line priced at zero"
        );
        if !ctx.json {
            eprintln!(
                "warning: no price for {} at {}, priced at zero",
                line.product_id, deposit
            );
        }
    }

    let (order, items) = draft.into_order()?;
    db.orders().insert(&order, &items).await?;
    db.close().await;

    info!(id = %order.id, lines = items.len(), total = order.total_cents, "Order created");

    let dto = OrderDto::new(order, items);
    if ctx.json {
        return ctx.print_json(&dto);
    }
    dto.print(ctx);
    Ok(())
}

async fn show(id: &str, ctx: &Context) -> CliResult<()> {
    validate_uuid(id)?;
    let id = id.trim();

    let db = ctx.open_db().await?;
    let order = db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
    let items = db.orders().items_for_order(id).await?;
    db.close().await;

    let dto = OrderDto::new(order, items);
    if ctx.json {
        return ctx.print_json(&dto);
    }
    dto.print(ctx);
    Ok(())
}

async fn change_status(id: &str, status: OrderStatus, ctx: &Context) -> CliResult<()> {
    validate_uuid(id)?;

    let db = ctx.open_db().await?;
    let order = db.orders().update_status(id.trim(), status).await?;
    db.close().await;

    let dto = OrderDto::new(order, Vec::new());
    if ctx.json {
        return ctx.print_json(&dto);
    }
    println!("Order {} is now {}", dto.id, dto.status);
    Ok(())
}

async fn list(ctx: &Context) -> CliResult<()> {
    let db = ctx.open_db().await?;
    let orders = db.orders().list_recent(ctx.config.search_limit).await?;
    db.close().await;

    let dtos: Vec<OrderDto> = orders
        .into_iter()
        .map(|o| OrderDto::new(o, Vec::new()))
        .collect();

    if ctx.json {
        return ctx.print_json(&dtos);
    }
    if dtos.is_empty() {
        println!("No orders");
    }
    for o in &dtos {
        println!(
            "{}  {:<10} {:<9} {:<12} {:>12}",
            o.id,
            o.status,
            o.mode,
            o.deposit_id.as_deref().unwrap_or("-"),
            ctx.money(o.total_cents)
        );
    }
    Ok(())
}
