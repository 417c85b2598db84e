//! # Domain Types
//!
//! ERP entities shared by the database layer and the CLI.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Deposit      │   │    Product      │   │     Client      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │   │  name           │   │  name           │       │
//! │  │  address        │   │  unit (P13...)  │   │  document (CPF) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │  OrderStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  deposit_id     │──►│  product_id     │   │  Pending        │       │
//! │  │  mode           │   │  unit_price     │   │  Delivered      │       │
//! │  │  total_cents    │   │  (frozen)       │   │  Cancelled      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing types (`PricingRule`, `PricingMode`) live in [`crate::pricing`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::PricingMode;

// =============================================================================
// Deposit
// =============================================================================

/// A physical stock/sales location that can carry its own price overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Deposit {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Soft delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product sold by the distributor (gas cylinder, water jug, ...).
///
/// Products carry no price of their own: every price comes from the
/// pricing overrides through [`crate::pricing::resolve_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Display name shown on orders.
    pub name: String,
    pub description: Option<String>,
    /// Commercial unit, e.g. "P13", "P45", "20L".
    pub unit: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// A customer of the distributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// CPF (11 digits) or CNPJ (14 digits), digits only.
    pub document: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Transitions
/// ```text
///            ┌──────────► Delivered
///  Pending ──┤
///            └──────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order taken, not yet delivered.
    #[default]
    Pending,
    /// Order delivered to the client.
    Delivered,
    /// Order cancelled before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Stored and displayed form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Checks that an order currently in `self` may move to `next`.
    pub fn ensure_can_become(self, next: OrderStatus, order_id: &str) -> CoreResult<()> {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::Delivered)
            | (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(()),
            _ => Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current_status: self.to_string(),
                requested_status: next.to_string(),
            }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Accepts the stored English names and the legacy Portuguese ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendente" | "aberto" => Ok(OrderStatus::Pending),
            "delivered" | "entregue" => Ok(OrderStatus::Delivered),
            "cancelled" | "canceled" | "cancelado" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "delivered".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order placed at a deposit under one pricing mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub client_id: Option<String>,
    pub deposit_id: Option<String>,
    pub mode: PricingMode,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order.
/// Uses the snapshot pattern: name and unit price are frozen at order time,
/// so later price override edits never rewrite past orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of order (frozen).
    pub name_snapshot: String,
    /// Unit price in centavos at time of order (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}
