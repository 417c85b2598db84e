//! # Pricing Module
//!
//! Resolves the price to charge for a product from the pricing overrides
//! configured by the back office.
//!
//! ## Fallback Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(product, deposit?, mode, rules)                                │
//! │                                                                         │
//! │  deposit given?                                                         │
//! │     │ yes                                                               │
//! │     ├─► rules for (product, deposit), FIRST value for mode              │
//! │     │        └─ found ─────────────────────────► DepositExact           │
//! │     ├─► mode != SIMPLE: FIRST value for SIMPLE                          │
//! │     │        └─ found ─────────────────────────► DepositSimpleFallback  │
//! │     ▼                                                                   │
//! │  rules for product (any deposit, or none), MIN value for mode          │
//! │           └─ found ────────────────────────────► GlobalMinimum          │
//! │  mode != SIMPLE: MIN value for SIMPLE                                   │
//! │           └─ found ────────────────────────────► GlobalSimpleFallback   │
//! │                                                                         │
//! │  nothing ──────────────────────────────────────► Unmatched (R$0,00)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside one deposit the rules are curated by an administrator, so the
//! first match wins. Across deposits there is no way to know which price is
//! right, so the lowest one is charged.
//!
//! Nothing here fails: a product with no applicable rule costs zero, exactly
//! like a product whose configured price is zero. Callers that must tell the
//! two apart use [`resolve`] and inspect [`PriceResolution::source`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::normalize;

// =============================================================================
// Pricing Mode
// =============================================================================

/// How a gas cylinder is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    /// Standard sale.
    #[default]
    Simple,
    /// Trade-in: the client hands back an empty cylinder.
    Exchange,
    /// Full unit sale, cylinder included, no trade-in.
    Full,
}

impl PricingMode {
    /// Every mode, in display order.
    pub const ALL: [PricingMode; 3] = [PricingMode::Simple, PricingMode::Exchange, PricingMode::Full];

    /// Maps any spelling used by the front-end or the legacy store to a
    /// mode. Unrecognized input is `Simple`.
    ///
    /// ## Example
    /// ```rust
    /// use flama_core::pricing::PricingMode;
    ///
    /// assert_eq!(PricingMode::normalize("TROCA"), PricingMode::Exchange);
    /// assert_eq!(PricingMode::normalize("completa"), PricingMode::Full);
    /// assert_eq!(PricingMode::normalize("bogus"), PricingMode::Simple);
    /// ```
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "exchange" | "troca" => PricingMode::Exchange,
            "full" | "completa" | "completo" | "cheio" => PricingMode::Full,
            _ => PricingMode::Simple,
        }
    }

    /// Stored and displayed form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PricingMode::Simple => "simple",
            PricingMode::Exchange => "exchange",
            PricingMode::Full => "full",
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient: any string (or null) deserializes, through [`PricingMode::normalize`].
impl<'de> Deserialize<'de> for PricingMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(PricingMode::normalize)
            .unwrap_or_default())
    }
}

// =============================================================================
// Pricing Rule
// =============================================================================

/// A pricing override for a product, optionally scoped to one deposit.
///
/// `deposit_id = None` is a global rule. Several rules may exist for the
/// same (product, deposit) pair, usually one per mode; duplicates are not
/// rejected here.
///
/// Through serde the three prices are integer centavos, the form
/// [`Money`] serializes to. Raw rows typed in reais (`"preco": 110`,
/// `"preco": "110,00"`) must go through [`normalize::pricing_rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingRule {
    pub product_id: String,
    #[serde(default)]
    pub deposit_id: Option<String>,
    /// The mode this rule was declared for.
    #[serde(default)]
    pub mode: PricingMode,
    /// Base price, used for SIMPLE.
    #[serde(default)]
    pub price: Option<Money>,
    /// Explicit EXCHANGE price.
    #[serde(default)]
    pub exchange_price: Option<Money>,
    /// Explicit FULL price.
    #[serde(default)]
    pub full_price: Option<Money>,
}

impl PricingRule {
    /// Creates a rule with no prices set.
    pub fn new(product_id: impl Into<String>, deposit_id: Option<&str>, mode: PricingMode) -> Self {
        PricingRule {
            product_id: product_id.into(),
            deposit_id: deposit_id.map(str::to_string),
            mode,
            price: None,
            exchange_price: None,
            full_price: None,
        }
    }

    /// A SIMPLE rule with a base price.
    pub fn simple(product_id: impl Into<String>, deposit_id: Option<&str>, price: Money) -> Self {
        PricingRule::new(product_id, deposit_id, PricingMode::Simple).with_price(price)
    }

    /// An EXCHANGE rule with an explicit exchange price.
    pub fn exchange(product_id: impl Into<String>, deposit_id: Option<&str>, price: Money) -> Self {
        PricingRule::new(product_id, deposit_id, PricingMode::Exchange).with_exchange_price(price)
    }

    /// A FULL rule with an explicit full price.
    pub fn full(product_id: impl Into<String>, deposit_id: Option<&str>, price: Money) -> Self {
        PricingRule::new(product_id, deposit_id, PricingMode::Full).with_full_price(price)
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_exchange_price(mut self, price: Money) -> Self {
        self.exchange_price = Some(price);
        self
    }

    pub fn with_full_price(mut self, price: Money) -> Self {
        self.full_price = Some(price);
        self
    }

    /// Whether this rule applies to every deposit.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.deposit_id.is_none()
    }

    /// The value this rule offers for `mode`, if any.
    ///
    /// ## Extraction
    /// ```text
    /// SIMPLE   → price
    /// EXCHANGE → exchange_price, else price if this rule's mode is EXCHANGE
    /// FULL     → full_price,     else price if this rule's mode is FULL
    /// ```
    pub fn value_for(&self, mode: PricingMode) -> Option<Money> {
        match mode {
            PricingMode::Simple => self.price,
            PricingMode::Exchange => self
                .exchange_price
                .or_else(|| self.declared_price(PricingMode::Exchange)),
            PricingMode::Full => self
                .full_price
                .or_else(|| self.declared_price(PricingMode::Full)),
        }
    }

    fn declared_price(&self, mode: PricingMode) -> Option<Money> {
        if self.mode == mode {
            self.price
        } else {
            None
        }
    }
}

// =============================================================================
// Price Query
// =============================================================================

/// One price lookup. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub product_id: String,
    pub deposit_id: Option<String>,
    pub mode: PricingMode,
}

impl PriceQuery {
    /// Builds a query. Identifiers are trimmed; an empty deposit id means
    /// "no deposit context".
    pub fn new(product_id: impl Into<String>, deposit_id: Option<&str>, mode: PricingMode) -> Self {
        let product_id: String = product_id.into();
        PriceQuery {
            product_id: product_id.trim().to_string(),
            deposit_id: deposit_id
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            mode,
        }
    }

    /// Builds a query from a raw mode string, normalizing it.
    pub fn from_raw(product_id: &str, deposit_id: Option<&str>, mode: &str) -> Self {
        PriceQuery::new(product_id, deposit_id, PricingMode::normalize(mode))
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Which step of the fallback chain produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// First rule of the deposit with a value for the requested mode.
    DepositExact,
    /// First rule of the deposit with a SIMPLE value.
    DepositSimpleFallback,
    /// Lowest value for the requested mode across all rules of the product.
    GlobalMinimum,
    /// Lowest SIMPLE value across all rules of the product.
    GlobalSimpleFallback,
    /// No rule applied; the price is zero.
    Unmatched,
}

impl PriceSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PriceSource::DepositExact => "deposit-exact",
            PriceSource::DepositSimpleFallback => "deposit-simple-fallback",
            PriceSource::GlobalMinimum => "global-min",
            PriceSource::GlobalSimpleFallback => "global-simple-fallback",
            PriceSource::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved price and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceResolution {
    pub price: Money,
    pub source: PriceSource,
}

impl PriceResolution {
    fn found(price: Money, source: PriceSource) -> Self {
        PriceResolution { price, source }
    }

    fn unmatched() -> Self {
        PriceResolution {
            price: Money::zero(),
            source: PriceSource::Unmatched,
        }
    }

    /// False when no rule applied (the zero price is a default).
    #[inline]
    pub fn is_matched(&self) -> bool {
        self.source != PriceSource::Unmatched
    }
}

/// Runs the fallback chain and reports which step answered.
pub fn resolve(query: &PriceQuery, rules: &[PricingRule]) -> PriceResolution {
    if query.product_id.is_empty() || rules.is_empty() {
        return PriceResolution::unmatched();
    }

    let mode = query.mode;

    if let Some(deposit_id) = query.deposit_id.as_deref() {
        let scoped: Vec<&PricingRule> = rules
            .iter()
            .filter(|r| r.product_id == query.product_id && r.deposit_id.as_deref() == Some(deposit_id))
            .collect();

        if let Some(price) = first_value(&scoped, mode) {
            return PriceResolution::found(price, PriceSource::DepositExact);
        }
        if mode != PricingMode::Simple {
            if let Some(price) = first_value(&scoped, PricingMode::Simple) {
                return PriceResolution::found(price, PriceSource::DepositSimpleFallback);
            }
        }
    }

    let product_rules: Vec<&PricingRule> = rules
        .iter()
        .filter(|r| r.product_id == query.product_id)
        .collect();

    if let Some(price) = min_value(&product_rules, mode) {
        return PriceResolution::found(price, PriceSource::GlobalMinimum);
    }
    if mode != PricingMode::Simple {
        if let Some(price) = min_value(&product_rules, PricingMode::Simple) {
            return PriceResolution::found(price, PriceSource::GlobalSimpleFallback);
        }
    }

    PriceResolution::unmatched()
}

/// The price to charge; zero when no rule applies.
///
/// ## Example
/// ```rust
/// use flama_core::money::Money;
/// use flama_core::pricing::{resolve_price, PriceQuery, PricingRule};
///
/// let rules = vec![PricingRule::simple("P13", Some("centro"), Money::from_cents(11000))];
///
/// // No EXCHANGE price at this deposit: falls back to its SIMPLE price
/// let query = PriceQuery::from_raw("P13", Some("centro"), "troca");
/// assert_eq!(resolve_price(&query, &rules).cents(), 11000);
///
/// // Unknown product
/// let query = PriceQuery::from_raw("P45", Some("centro"), "simples");
/// assert!(resolve_price(&query, &rules).is_zero());
/// ```
pub fn resolve_price(query: &PriceQuery, rules: &[PricingRule]) -> Money {
    resolve(query, rules).price
}

/// [`resolve`] over raw records as returned by the hosted database or the
/// legacy store. Records that do not normalize into a rule are skipped.
pub fn resolve_from_rows(query: &PriceQuery, rows: &[serde_json::Value]) -> PriceResolution {
    let rules = normalize::pricing_rules(rows);
    resolve(query, &rules)
}

/// [`resolve_price`] over raw records.
pub fn resolve_price_from_rows(query: &PriceQuery, rows: &[serde_json::Value]) -> Money {
    resolve_from_rows(query, rows).price
}

fn first_value(rules: &[&PricingRule], mode: PricingMode) -> Option<Money> {
    rules.iter().find_map(|r| r.value_for(mode))
}

fn min_value(rules: &[&PricingRule], mode: PricingMode) -> Option<Money> {
    rules.iter().filter_map(|r| r.value_for(mode)).min()
}

// =============================================================================
// Unit Tests
// =============================================================================
