//! # flama-core: Pure Business Logic for Flama ERP
//!
//! Everything the gas-distribution back office decides without touching a
//! database lives here, as pure functions with zero I/O dependencies.
//!
//! ## Where It Sits
//! ```text
//!   flama (apps/cli)            parses flags, prints results
//!        │
//!        ├──────────────► flama-db       SQLite rows ⇄ the types below
//!        │                    │
//!        ▼                    ▼
//!   flama-core  ◄─────────────┘
//!   ├── pricing     resolve(query, rules) → price + fallback tier
//!   ├── normalize   raw JSON rows in any naming convention → rules
//!   ├── order       drafts priced line by line, frozen on creation
//!   └── legacy      offline cache dumps: purge the queue, extract records
//! ```
//!
//! Nothing in this crate performs I/O or needs a runtime.
//!
//! ## Modules
//!
//! - [`types`] - ERP entities (Deposit, Product, Client, Order)
//! - [`money`] - Money type in integer centavos
//! - [`pricing`] - Price resolution over pricing overrides
//! - [`normalize`] - Raw record normalization across naming conventions
//! - [`order`] - Order drafts priced by the resolver
//! - [`legacy`] - Legacy offline store parsing and cleanup
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use flama_core::money::Money;
//! use flama_core::pricing::{resolve_price, PriceQuery, PricingMode, PricingRule};
//!
//! let rules = vec![
//!     PricingRule::simple("P13", Some("centro"), Money::from_cents(11000)),
//!     PricingRule::simple("P13", Some("norte"), Money::from_cents(10500)),
//! ];
//!
//! // Deposit-specific price wins inside its deposit
//! let query = PriceQuery::new("P13", Some("centro"), PricingMode::Simple);
//! assert_eq!(resolve_price(&query, &rules).cents(), 11000);
//!
//! // Without a deposit, the lowest known price is used
//! let query = PriceQuery::new("P13", None, PricingMode::Simple);
//! assert_eq!(resolve_price(&query, &rules).cents(), 10500);
//! ```

pub mod error;
pub mod legacy;
pub mod money;
pub mod normalize;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{
    resolve, resolve_from_rows, resolve_price, resolve_price_from_rows, PriceQuery,
    PriceResolution, PriceSource, PricingMode, PricingRule,
};
pub use types::*;

/// Distinct products allowed on one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Largest quantity of one product on one order. Catches a mistyped
/// 1000 where 10 was meant.
pub const MAX_ITEM_QUANTITY: i64 = 999;
