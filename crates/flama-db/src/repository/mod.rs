//! # Repository Module
//!
//! Database repository implementations for Flama ERP.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                            │
//! │       │  db.pricing_rules().list_for_product("P13")                     │
//! │       ▼                                                                 │
//! │  PricingRuleRepository                                                 │
//! │  ├── list_for_product / list_for_products                              │
//! │  ├── upsert (keyed by product, deposit, mode)                          │
//! │  └── delete                                                            │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`deposit::DepositRepository`] - Deposits
//! - [`product::ProductRepository`] - Product catalog and search
//! - [`client::ClientRepository`] - Clients
//! - [`pricing::PricingRuleRepository`] - Pricing overrides
//! - [`order::OrderRepository`] - Orders and their items

pub mod client;
pub mod deposit;
pub mod order;
pub mod pricing;
pub mod product;

/// Builds a `LIKE` pattern matching `query` anywhere, with `%`, `_` and
/// `\` escaped. Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use flama_core::{Client, Deposit, Product};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn deposit(id: &str, name: &str) -> Deposit {
        Deposit {
            id: id.to_string(),
            name: name.to_string(),
            address: None,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            unit: Some(id.to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn client(id: &str, name: &str, document: Option<&str>) -> Client {
        Client {
            id: id.to_string(),
            name: name.to_string(),
            document: document.map(str::to_string),
            phone: None,
            address: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("gás"), "%gás%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("p_13"), "%p\\_13%");
    }
}
