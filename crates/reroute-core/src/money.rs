//! # Money Module
//!
//! Provides the `Money` type for route costs and budgets, and the
//! `CurrencyCode` type for the currency a budget was stated in.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DETERMINISTIC PLANS NEED EXACT TOTALS                                  │
//! │                                                                         │
//! │  A plan total is Σ(unit_cost × units) over dozens of routes.           │
//! │  With f64 the order of summation changes the last bits, and two        │
//! │  "identical" solves could disagree on which plan is cheaper.           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units of the base currency                 │
//! │    unit cost 12.50 USD → 1250                                           │
//! │    × 400 units         → 500000 (exact, order-independent)              │
//! │                                                                         │
//! │  Floats only appear where a multiplier or exchange rate is applied     │
//! │  to a single amount, and are rounded back immediately.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of the base currency (cents).
///
/// Signed so that impact deltas can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(1250); // 12.50 per unit
    /// assert_eq!(unit_cost.cents(), 1250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Cost of shipping `units` at this per-unit price.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(1250);
    /// assert_eq!(unit_cost.times_units(400).cents(), 500_000);
    /// ```
    ///
    /// Saturates at the `i64` bounds instead of wrapping.
    #[inline]
    pub const fn times_units(&self, units: u64) -> Self {
        let units = if units > i64::MAX as u64 {
            i64::MAX
        } else {
            units as i64
        };
        Money(self.0.saturating_mul(units))
    }

    #[inline]
    pub const fn saturating_add(self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Scales the amount by a real factor, rounding half away from zero.
    ///
    /// Used for disruption multipliers and currency conversion. The rounding
    /// happens once per amount, so totals built from scaled unit costs stay
    /// exact integers.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::money::Money;
    ///
    /// let base = Money::from_cents(333);
    /// assert_eq!(base.scale(1.5).cents(), 500); // 499.5 → 500
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        Money((self.0 as f64 * factor).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount without a currency symbol; the base currency is
/// configuration, not part of the value.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Currency Code
// =============================================================================

/// ISO-4217 style currency code ("USD", "INR").
///
/// Always three uppercase ASCII letters. Parsing upper-cases the input, so
/// `"inr".parse()` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// For literals known to be well-formed.
    pub(crate) fn from_static(code: &'static str) -> Self {
        CurrencyCode(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();

        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("'{}' is not a three-letter currency code", s.trim()),
            });
        }

        Ok(CurrencyCode(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
