//! # Pricing Rule Repository
//!
//! Stores the pricing overrides the resolver reads.
//!
//! ## Rule Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (product_id, deposit_id, mode) identifies a rule                       │
//! │                                                                         │
//! │  P13 │ centro │ simple    → price 110,00                                │
//! │  P13 │ centro │ exchange  → exchange_price 95,00                        │
//! │  P13 │ NULL   │ simple    → price 115,00   (global rule)                │
//! │                                                                         │
//! │  upsert() on an existing key rewrites its prices in place, keeping      │
//! │  its position in the list the resolver scans.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules come back in insertion order (rowid); inside a deposit the first
//! applicable rule wins.

use chrono::Utc;
use flama_core::{Money, PricingMode, PricingRule};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const RULE_COLUMNS: &str =
    "product_id, deposit_id, mode, price_cents, exchange_price_cents, full_price_cents";

/// A `pricing_rules` row. The mode is stored as text.
#[derive(Debug, sqlx::FromRow)]
struct PricingRuleRow {
    product_id: String,
    deposit_id: Option<String>,
    mode: String,
    price_cents: Option<i64>,
    exchange_price_cents: Option<i64>,
    full_price_cents: Option<i64>,
}

impl From<PricingRuleRow> for PricingRule {
    fn from(row: PricingRuleRow) -> Self {
        PricingRule {
            product_id: row.product_id,
            deposit_id: row.deposit_id,
            mode: PricingMode::normalize(&row.mode),
            price: row.price_cents.map(Money::from_cents),
            exchange_price: row.exchange_price_cents.map(Money::from_cents),
            full_price: row.full_price_cents.map(Money::from_cents),
        }
    }
}

/// Whether an upsert created a rule or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleWrite {
    Created,
    Updated,
}

/// Repository for pricing overrides.
#[derive(Debug, Clone)]
pub struct PricingRuleRepository {
    pool: SqlitePool,
}

impl PricingRuleRepository {
    /// Creates a new PricingRuleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PricingRuleRepository { pool }
    }

    /// All rules of one product, deposit-scoped and global, in insertion order.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<PricingRule>> {
        let rows = sqlx::query_as::<_, PricingRuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM pricing_rules WHERE product_id = ?1 ORDER BY rowid"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(product_id = %product_id, count = rows.len(), "Loaded pricing rules");
        Ok(rows.into_iter().map(PricingRule::from).collect())
    }

    /// Rules of several products at once (order pricing), in insertion order.
    pub async fn list_for_products(&self, product_ids: &[String]) -> DbResult<Vec<PricingRule>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {RULE_COLUMNS} FROM pricing_rules WHERE product_id IN ("
        ));
        let mut ids = builder.separated(", ");
        for id in product_ids {
            ids.push_bind(id);
        }
        ids.push_unseparated(") ORDER BY rowid");

        let rows = builder
            .build_query_as::<PricingRuleRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(products = product_ids.len(), count = rows.len(), "Loaded pricing rules");
        Ok(rows.into_iter().map(PricingRule::from).collect())
    }

    /// Every rule, in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<PricingRule>> {
        let rows = sqlx::query_as::<_, PricingRuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM pricing_rules ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PricingRule::from).collect())
    }

    /// Sets the prices of the rule keyed by (product, deposit, mode),
    /// creating it when missing.
    ///
    /// Prices are not validated: zero and negative overrides are stored
    /// as given.
    ///
    /// ## Errors
    /// - `DbError::ForeignKeyViolation` - unknown product or deposit
    pub async fn upsert(&self, rule: &PricingRule) -> DbResult<RuleWrite> {
        debug!(
            product_id = %rule.product_id,
            deposit_id = ?rule.deposit_id,
            mode = %rule.mode,
            "Upserting pricing rule"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // `IS` matches NULL deposits (global rules)
        let updated = sqlx::query(
            r#"
            UPDATE pricing_rules SET
                price_cents = ?4,
                exchange_price_cents = ?5,
                full_price_cents = ?6,
                updated_at = ?7
            WHERE product_id = ?1 AND deposit_id IS ?2 AND mode = ?3
            "#,
        )
        .bind(&rule.product_id)
        .bind(&rule.deposit_id)
        .bind(rule.mode.as_str())
        .bind(rule.price.map(|m| m.cents()))
        .bind(rule.exchange_price.map(|m| m.cents()))
        .bind(rule.full_price.map(|m| m.cents()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let outcome = if updated.rows_affected() > 0 {
            RuleWrite::Updated
        } else {
            sqlx::query(
                r#"
                INSERT INTO pricing_rules (
                    id, product_id, deposit_id, mode,
                    price_cents, exchange_price_cents, full_price_cents,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&rule.product_id)
            .bind(&rule.deposit_id)
            .bind(rule.mode.as_str())
            .bind(rule.price.map(|m| m.cents()))
            .bind(rule.exchange_price.map(|m| m.cents()))
            .bind(rule.full_price.map(|m| m.cents()))
            .bind(now)
            .execute(&mut *tx)
            .await?;
            RuleWrite::Created
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Deletes the rule keyed by (product, deposit, mode).
    pub async fn delete(
        &self,
        product_id: &str,
        deposit_id: Option<&str>,
        mode: PricingMode,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, deposit_id = ?deposit_id, mode = %mode, "Deleting pricing rule");

        let result = sqlx::query(
            "DELETE FROM pricing_rules WHERE product_id = ?1 AND deposit_id IS ?2 AND mode = ?3",
        )
        .bind(product_id)
        .bind(deposit_id)
        .bind(mode.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Pricing rule",
                format!("{}/{}/{}", product_id, deposit_id.unwrap_or("*"), mode),
            ));
        }

        Ok(())
    }

    /// Counts stored rules.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pricing_rules")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{deposit, product, test_db};
    use crate::Database;
    use flama_core::{resolve, PriceQuery, PriceSource};

    async fn catalog() -> Database {
        let db = test_db().await;
        db.deposits().upsert(&deposit("centro", "Centro")).await.unwrap();
        db.deposits().upsert(&deposit("norte", "Norte")).await.unwrap();
        db.products().upsert(&product("P13", "Botijão P13")).await.unwrap();
        db.products().upsert(&product("P45", "Botijão P45")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let db = catalog().await;
        let repo = db.pricing_rules();

        let rule = PricingRule::simple("P13", Some("centro"), Money::from_cents(11000));
        assert_eq!(repo.upsert(&rule).await.unwrap(), RuleWrite::Created);

        let rule = PricingRule::simple("P13", Some("centro"), Money::from_cents(11500));
        assert_eq!(repo.upsert(&rule).await.unwrap(), RuleWrite::Updated);

        let rules = repo.list_for_product("P13").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].price, Some(Money::from_cents(11500)));
    }

    #[tokio::test]
    async fn test_global_rule_is_its_own_key() {
        let db = catalog().await;
        let repo = db.pricing_rules();

        repo.upsert(&PricingRule::simple("P13", None, Money::from_cents(12000)))
            .await
            .unwrap();
        repo.upsert(&PricingRule::simple("P13", Some("centro"), Money::from_cents(11000)))
            .await
            .unwrap();
        let again = repo
            .upsert(&PricingRule::simple("P13", None, Money::from_cents(11900)))
            .await
            .unwrap();

        assert_eq!(again, RuleWrite::Updated);
        assert_eq!(repo.count().await.unwrap(), 2);

        let rules = repo.list_for_product("P13").await.unwrap();
        assert!(rules[0].is_global());
        assert_eq!(rules[0].price, Some(Money::from_cents(11900)));
    }

    #[tokio::test]
    async fn test_stored_rules_feed_the_resolver() {
        let db = catalog().await;
        let repo = db.pricing_rules();

        repo.upsert(&PricingRule::simple("P13", Some("centro"), Money::from_cents(500)))
            .await
            .unwrap();
        repo.upsert(&PricingRule::simple("P13", Some("norte"), Money::from_cents(300)))
            .await
            .unwrap();
        repo.upsert(&PricingRule::exchange("P13", Some("norte"), Money::from_cents(250)))
            .await
            .unwrap();

        let rules = repo.list_for_product("P13").await.unwrap();

        let at_centro = resolve(&PriceQuery::new("P13", Some("centro"), PricingMode::Simple), &rules);
        assert_eq!(at_centro.price.cents(), 500);

        let anywhere = resolve(&PriceQuery::new("P13", None, PricingMode::Simple), &rules);
        assert_eq!(anywhere.price.cents(), 300);

        let exchange = resolve(&PriceQuery::new("P13", Some("centro"), PricingMode::Exchange), &rules);
        assert_eq!(exchange.price.cents(), 500);
        assert_eq!(exchange.source, PriceSource::DepositSimpleFallback);

        let exchange_anywhere = resolve(&PriceQuery::new("P13", None, PricingMode::Exchange), &rules);
        assert_eq!(exchange_anywhere.price.cents(), 250);
        assert_eq!(exchange_anywhere.source, PriceSource::GlobalMinimum);
    }

    #[tokio::test]
    async fn test_negative_prices_are_stored() {
        let db = catalog().await;
        let repo = db.pricing_rules();

        repo.upsert(&PricingRule::simple("P13", None, Money::from_cents(-100)))
            .await
            .unwrap();
        let rules = repo.list_for_product("P13").await.unwrap();
        assert_eq!(rules[0].price, Some(Money::from_cents(-100)));
    }

    #[tokio::test]
    async fn test_list_for_products() {
        let db = catalog().await;
        let repo = db.pricing_rules();

        repo.upsert(&PricingRule::simple("P13", None, Money::from_cents(11000)))
            .await
            .unwrap();
        repo.upsert(&PricingRule::simple("P45", None, Money::from_cents(42000)))
            .await
            .unwrap();

        let both = repo
            .list_for_products(&["P13".to_string(), "P45".to_string()])
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
        assert!(repo.list_for_products(&[]).await.unwrap().is_empty());
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_product_is_a_foreign_key_violation() {
        let db = catalog().await;
        let err = db
            .pricing_rules()
            .upsert(&PricingRule::simple("P99", None, Money::from_cents(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = catalog().await;
        let repo = db.pricing_rules();
        repo.upsert(&PricingRule::exchange("P13", Some("centro"), Money::from_cents(9500)))
            .await
            .unwrap();

        repo.delete("P13", Some("centro"), PricingMode::Exchange).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);

        assert!(matches!(
            repo.delete("P13", Some("centro"), PricingMode::Exchange).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
