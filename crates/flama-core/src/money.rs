//! # Money
//!
//! Every amount in the system is an `i64` of centavos wrapped in [`Money`].
//!
//! ```text
//!  raw reais                      centavos              display
//!  ─────────                      ────────              ───────
//!  110          ─┐
//!  "110,00"      ├─ Money::parse ─►  11000  ─ Display ─► R$110,00
//!  "R$ 110"     ─┘   (rust_decimal,
//!  110.0        ──── read_money)
//! ```
//!
//! The legacy front-end kept prices as JavaScript floats. They are turned
//! into a `Decimal` once, at the boundary, and rounded to centavos there;
//! no float arithmetic happens after that.
//!
//! ```rust
//! use flama_core::money::Money;
//!
//! let p13 = Money::from_cents(11000);
//! assert_eq!((p13 * 2).to_string(), "R$220,00");
//! assert_eq!(Money::parse("1.234,56").unwrap().cents(), 123456);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use ts_rs::TS;

/// An amount in centavos. Signed: overrides are stored as given, and a
/// negative price is a legal (if odd) configuration.
///
/// Serializes as a bare integer of centavos: `11000` is R$110,00.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Reais to centavos, half-to-even on the third decimal.
    /// `None` when the result overflows i64.
    ///
    /// ```rust
    /// use flama_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::from_decimal(Decimal::new(110125, 3)).unwrap().cents(), 11012);
    /// ```
    pub fn from_decimal(reais: Decimal) -> Option<Self> {
        reais
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .trunc()
            .to_i64()
            .map(Money)
    }

    /// Parses reais as an operator types them or the legacy store saved
    /// them.
    ///
    /// | input        | centavos |
    /// |--------------|----------|
    /// | `110`        | 11000    |
    /// | `110.5`      | 11050    |
    /// | `110,5`      | 11050    |
    /// | `1.234,56`   | 123456   |
    /// | `R$ 110,00`  | 11000    |
    /// | `0.125`      | 12       |
    /// | `1.500`      | `None`   |
    /// | `""`, `abc`  | `None`   |
    ///
    /// Once a comma is present it is the decimal mark and every dot is a
    /// thousands separator. Without a comma a dot is the decimal mark,
    /// except that `1.500` could be either, so it is refused.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix("R$").map_or(trimmed, str::trim);
        if body.is_empty() || (!body.contains(',') && is_dot_grouped(body)) {
            return None;
        }

        let decimal = if body.contains(',') {
            Decimal::from_str(&body.replace('.', "").replace(',', "."))
        } else {
            Decimal::from_str(body)
        };
        decimal.ok().and_then(Money::from_decimal)
    }

    /// Unit price times quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `None` when the product leaves the i64 range.
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// Digits grouped by dots in threes, like `1.500` or `-12.345`.
fn is_dot_grouped(body: &str) -> bool {
    let digits = body.strip_prefix('-').unwrap_or(body);
    let mut groups = digits.split('.');
    let lead = groups.next().unwrap_or_default();
    let rest: Vec<&str> = groups.collect();

    let all_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    !rest.is_empty()
        && (1..=3).contains(&lead.len())
        && !lead.starts_with('0')
        && all_digits(lead)
        && rest.iter().all(|g| g.len() == 3 && all_digits(g))
}

/// `R$1.234,56`, `-R$5,50`, `R$0,00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let digits = (magnitude / 100).to_string();

        if self.0 < 0 {
            f.write_str("-")?;
        }
        f.write_str("R$")?;
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", ch)?;
        }
        write!(f, ",{:02}", magnitude % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
