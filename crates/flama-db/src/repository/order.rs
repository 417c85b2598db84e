//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PRICE (flama-core)                                                 │
//! │     └── OrderDraft::add_product() → unit price frozen per line         │
//! │                                                                         │
//! │  2. STORE                                                              │
//! │     └── insert(order, items) → orders + order_items, one transaction   │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── update_status(Delivered | Cancelled)                           │
//! │         (only from Pending)                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use flama_core::{Order, OrderItem, OrderStatus, PricingMode};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str =
    "id, client_id, deposit_id, mode, status, total_cents, notes, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name_snapshot, unit_price_cents, \
     quantity, line_total_cents, created_at";

/// An `orders` row. Mode and status are stored as text.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    client_id: Option<String>,
    deposit_id: Option<String>,
    mode: String,
    status: String,
    total_cents: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| DbError::CorruptRow {
                entity: "Order".to_string(),
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Order {
            id: row.id,
            client_id: row.client_id,
            deposit_id: row.deposit_id,
            mode: PricingMode::normalize(&row.mode),
            status,
            total_cents: row.total_cents,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Stores an order and its items atomically.
    ///
    /// ## Errors
    /// - `DbError::ForeignKeyViolation` - unknown client, deposit or product
    /// - `DbError::UniqueViolation` - the order id already exists
    pub async fn insert(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(id = %order.id, items = items.len(), total = %order.total(), "Inserting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, client_id, deposit_id, mode, status,
                total_cents, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_id)
        .bind(&order.deposit_id)
        .bind(order.mode.as_str())
        .bind(order.status.as_str())
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id,
                    name_snapshot, unit_price_cents,
                    quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %order.id, total = %order.total(), "Order stored");
        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets the items of an order in the order they were added.
    pub async fn items_for_order(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the most recent orders, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Moves an order to `next`, returning the updated order.
    ///
    /// ## Errors
    /// - `DbError::NotFound` - no order with this id
    /// - `DbError::Domain` - the transition is not allowed (e.g. delivering
    ///   a cancelled order)
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        let mut order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        order.status.ensure_can_become(next, id)?;

        let now = Utc::now();
        // Guarded on the current status so a concurrent change is not overwritten
        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(next.as_str())
        .bind(now)
        .bind(order.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", id));
        }

        info!(id = %id, from = %order.status, to = %next, "Order status changed");

        order.status = next;
        order.updated_at = now;
        Ok(order)
    }

    /// Counts stored orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
