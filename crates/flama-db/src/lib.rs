//! # flama-db: Database Layer for Flama ERP
//!
//! Persistence for deposits, products, clients, pricing overrides and
//! orders, on a local SQLite file through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Flama ERP Data Flow                              │
//! │                                                                         │
//! │  `flama price --product P13 --deposit centro --mode troca`             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     flama-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ deposit        │   │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ product/client │   │ 0001_init    │  │   │
//! │  │   │               │    │ pricing/order  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<PricingRule> ──► flama_core::resolve()                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database enforces uniqueness and foreign keys; repositories only
//! translate between rows and domain types.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flama_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./flama.db")).await?;
//! let rules = db.pricing_rules().list_for_product("P13").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::client::ClientRepository;
pub use repository::deposit::DepositRepository;
pub use repository::order::OrderRepository;
pub use repository::pricing::{PricingRuleRepository, RuleWrite};
pub use repository::product::ProductRepository;
