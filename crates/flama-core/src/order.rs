//! # Order Drafts
//!
//! Builds an order line by line, pricing every product through the
//! resolver at the moment it is added.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft::new(deposit, mode)                                         │
//! │       │                                                                 │
//! │       ├── add_product(P13, 2, rules) ──► resolve_price ──► line frozen  │
//! │       ├── add_product(P13, 1, rules) ──► same line, quantity 3          │
//! │       ├── update_quantity(P13, 0)    ──► line removed                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  into_order() ──► (Order, Vec<OrderItem>) ready for OrderRepository     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unit prices never change after a line is created, even if the overrides
//! are edited while the draft is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{resolve, PriceQuery, PriceResolution, PriceSource, PricingMode, PricingRule};
use crate::types::{Order, OrderItem, OrderStatus, Product};
use crate::validation::{validate_order_size, validate_quantity};
use crate::MAX_ITEM_QUANTITY;

/// One product line of a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    /// Product name when the line was added (frozen).
    pub name: String,
    /// Resolved unit price (frozen).
    pub unit_price_cents: i64,
    /// Fallback tier that produced the unit price.
    pub price_source: PriceSource,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl OrderLine {
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// True when no override priced this product.
    pub fn is_unpriced(&self) -> bool {
        self.price_source == PriceSource::Unmatched
    }
}

/// An order being assembled.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increases quantity)
/// - Quantity per line is 1..=999
/// - At most 100 lines
/// - Every line total and the order total fit in i64 centavos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub deposit_id: Option<String>,
    pub client_id: Option<String>,
    pub mode: PricingMode,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Starts an empty draft. An empty deposit id means no deposit.
    pub fn new(deposit_id: Option<&str>, mode: PricingMode) -> Self {
        OrderDraft {
            deposit_id: deposit_id
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            client_id: None,
            mode,
            notes: None,
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Adds `quantity` of `product`, pricing it against `rules` if it is not
    /// in the draft yet.
    ///
    /// Returns the price the line carries and where it came from. A product
    /// with no applicable override is added at R$0,00 with
    /// [`PriceSource::Unmatched`].
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
        rules: &[PricingRule],
    ) -> CoreResult<PriceResolution> {
        validate_quantity(quantity)?;

        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id.clone()));
        }

        if let Some(idx) = self.lines.iter().position(|l| l.product_id == product.id) {
            let requested = self.lines[idx].quantity + quantity;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            let price = self.lines[idx].unit_price();
            self.ensure_total_fits(&product.id, price, requested)?;

            let line = &mut self.lines[idx];
            line.quantity = requested;
            return Ok(PriceResolution {
                price,
                source: line.price_source,
            });
        }

        validate_order_size(self.lines.len()).map_err(|_| CoreError::OrderTooLarge {
            max: crate::MAX_ORDER_LINES,
        })?;

        let query = PriceQuery::new(product.id.as_str(), self.deposit_id.as_deref(), self.mode);
        let resolution = resolve(&query, rules);
        self.ensure_total_fits(&product.id, resolution.price, quantity)?;

        self.lines.push(OrderLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: resolution.price.cents(),
            price_source: resolution.source,
            quantity,
            added_at: Utc::now(),
        });

        Ok(resolution)
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInOrder(product_id.to_string()))?;
        self.ensure_total_fits(product_id, self.lines[idx].unit_price(), quantity)?;
        self.lines[idx].quantity = quantity;
        Ok(())
    }

    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::ProductNotInOrder(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Fails with [`CoreError::TotalOverflow`] unless the draft still has
    /// representable totals once `product_id` carries `quantity` at
    /// `unit_price`.
    fn ensure_total_fits(&self, product_id: &str, unit_price: Money, quantity: i64) -> CoreResult<()> {
        let others = self
            .lines
            .iter()
            .filter(|l| l.product_id != product_id)
            .map(|l| l.unit_price().checked_mul_quantity(l.quantity));

        others
            .chain(std::iter::once(unit_price.checked_mul_quantity(quantity)))
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line?))
            .map(|_| ())
            .ok_or(CoreError::TotalOverflow)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines that no override priced.
    pub fn unpriced_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|l| l.is_unpriced())
    }

    /// Freezes the draft into a pending order and its items.
    pub fn into_order(self) -> CoreResult<(Order, Vec<OrderItem>)> {
        if self.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        // Drafts can arrive deserialized, so the totals are rechecked here
        let total = self
            .lines
            .iter()
            .try_fold(Money::zero(), |acc, l| {
                acc.checked_add(l.unit_price().checked_mul_quantity(l.quantity)?)
            })
            .ok_or(CoreError::TotalOverflow)?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let items = self
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total().cents(),
                created_at: now,
            })
            .collect();

        let order = Order {
            id: order_id,
            client_id: self.client_id,
            deposit_id: self.deposit_id,
            mode: self.mode,
            status: OrderStatus::Pending,
            total_cents: total.cents(),
            notes: self.notes,
            created_at: now,
            updated_at: now,
        };

        Ok((order, items))
    }
}

/// Draft summary for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub unpriced_lines: usize,
    pub total_cents: i64,
}

impl From<&OrderDraft> for OrderTotals {
    fn from(draft: &OrderDraft) -> Self {
        OrderTotals {
            line_count: draft.line_count(),
            total_quantity: draft.total_quantity(),
            unpriced_lines: draft.unpriced_lines().count(),
            total_cents: draft.total().cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Botijão {}", id),
            description: None,
            unit: Some(id.to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rules() -> Vec<PricingRule> {
        vec![
            PricingRule::simple("P13", Some("centro"), Money::from_cents(11000)),
            PricingRule::exchange("P13", Some("centro"), Money::from_cents(9500)),
            PricingRule::simple("P45", None, Money::from_cents(42000)),
        ]
    }

    #[test]
    fn test_add_product_prices_through_resolver() {
        let mut draft = OrderDraft::new(Some("centro"), PricingMode::Exchange);

        let resolution = draft.add_product(&product("P13"), 2, &rules()).unwrap();
        assert_eq!(resolution.price.cents(), 9500);
        assert_eq!(resolution.source, PriceSource::DepositExact);

        let resolution = draft.add_product(&product("P45"), 1, &rules()).unwrap();
        assert_eq!(resolution.source, PriceSource::GlobalSimpleFallback);

        assert_eq!(draft.line_count(), 2);
        assert_eq!(draft.total().cents(), 2 * 9500 + 42000);
    }

    #[test]
    fn test_add_same_product_merges_and_keeps_frozen_price() {
        let mut draft = OrderDraft::new(Some("centro"), PricingMode::Simple);
        draft.add_product(&product("P13"), 2, &rules()).unwrap();

        // Price edited while the draft is open
        let edited = vec![PricingRule::simple("P13", Some("centro"), Money::from_cents(99999))];
        let resolution = draft.add_product(&product("P13"), 3, &edited).unwrap();

        assert_eq!(draft.line_count(), 1);
        assert_eq!(draft.total_quantity(), 5);
        assert_eq!(resolution.price.cents(), 11000);
        assert_eq!(draft.total().cents(), 55000);
    }

    #[test]
    fn test_unpriced_product_is_added_at_zero() {
        let mut draft = OrderDraft::new(Some("centro"), PricingMode::Simple);
        let resolution = draft.add_product(&product("AGUA20"), 1, &rules()).unwrap();

        assert!(resolution.price.is_zero());
        assert_eq!(draft.unpriced_lines().count(), 1);
        assert_eq!(OrderTotals::from(&draft).unpriced_lines, 1);
    }

    #[test]
    fn test_quantity_limits() {
        let mut draft = OrderDraft::new(None, PricingMode::Simple);
        let p13 = product("P13");

        assert!(matches!(
            draft.add_product(&p13, 0, &rules()),
            Err(CoreError::Validation(_))
        ));

        draft.add_product(&p13, 999, &rules()).unwrap();
        assert!(matches!(
            draft.add_product(&p13, 1, &rules()),
            Err(CoreError::QuantityTooLarge { requested: 1000, max: 999 })
        ));
        assert!(matches!(
            draft.update_quantity("P13", 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(draft.update_quantity("P13", -2).is_err());
    }

    #[test]
    fn test_line_limit() {
        let mut draft = OrderDraft::new(None, PricingMode::Simple);
        for i in 0..crate::MAX_ORDER_LINES {
            draft.add_product(&product(&format!("P{}", i)), 1, &[]).unwrap();
        }
        assert!(matches!(
            draft.add_product(&product("EXTRA"), 1, &[]),
            Err(CoreError::OrderTooLarge { max: 100 })
        ));
    }

    #[test]
    fn test_totals_that_overflow_are_rejected() {
        let ceiling = Money::parse("90000000000000000").unwrap();
        let huge = vec![
            PricingRule::simple("P13", None, ceiling),
            PricingRule::simple("P45", None, ceiling),
        ];
        let mut draft = OrderDraft::new(None, PricingMode::Simple);

        assert!(matches!(
            draft.add_product(&product("P13"), 2, &huge),
            Err(CoreError::TotalOverflow)
        ));
        assert!(draft.is_empty());

        draft.add_product(&product("P13"), 1, &huge).unwrap();
        assert!(matches!(
            draft.add_product(&product("P13"), 1, &huge),
            Err(CoreError::TotalOverflow)
        ));
        assert!(matches!(
            draft.update_quantity("P13", 5),
            Err(CoreError::TotalOverflow)
        ));
        assert!(matches!(
            draft.add_product(&product("P45"), 1, &huge),
            Err(CoreError::TotalOverflow)
        ));

        assert_eq!(draft.total_quantity(), 1);
        assert_eq!(draft.total().cents(), 9_000_000_000_000_000_000);
    }

    #[test]
    fn test_deserialized_draft_with_overflowing_lines_is_rejected() {
        let mut draft = OrderDraft::new(None, PricingMode::Simple);
        draft.add_product(&product("P13"), 1, &rules()).unwrap();
        draft.lines[0].unit_price_cents = i64::MAX;
        draft.lines[0].quantity = 2;

        assert!(matches!(draft.into_order(), Err(CoreError::TotalOverflow)));
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut draft = OrderDraft::new(None, PricingMode::Simple);
        let mut p13 = product("P13");
        p13.is_active = false;

        assert!(matches!(
            draft.add_product(&p13, 1, &rules()),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let mut draft = OrderDraft::new(Some("centro"), PricingMode::Simple);
        draft.add_product(&product("P13"), 1, &rules()).unwrap();

        draft.update_quantity("P13", 4).unwrap();
        assert_eq!(draft.total().cents(), 44000);

        draft.update_quantity("P13", 0).unwrap();
        assert!(draft.is_empty());

        assert!(matches!(
            draft.remove_line("P13"),
            Err(CoreError::ProductNotInOrder(_))
        ));
    }

    #[test]
    fn test_into_order_snapshots_lines() {
        let mut draft = OrderDraft::new(Some("centro"), PricingMode::Simple)
            .with_client("c1")
            .with_notes("portão azul");
        draft.add_product(&product("P13"), 2, &rules()).unwrap();

        let (order, items) = draft.into_order().unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.deposit_id.as_deref(), Some("centro"));
        assert_eq!(order.client_id.as_deref(), Some("c1"));
        assert_eq!(order.total_cents, 22000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, order.id);
        assert_eq!(items[0].name_snapshot, "Botijão P13");
        assert_eq!(items[0].line_total_cents, 22000);
    }

    #[test]
    fn test_empty_draft_cannot_become_order() {
        let draft = OrderDraft::new(None, PricingMode::Simple);
        assert!(draft.into_order().is_err());
    }
}
