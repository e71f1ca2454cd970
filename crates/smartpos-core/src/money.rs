//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Summing 10,000 sale lines in f64 drifts by fractions of a cent,       │
//! │  and the analytics totals stop matching the receipts.                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    price_cents × quantity = subtotal_cents (exact)                     │
//! │    Σ subtotal_cents       = total_cents    (exact)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use smartpos_core::money::Money;
//!
//! let price = Money::from_cents(1099);            // 10.99
//! let line = price.multiply_quantity(2);          // 21.98
//! let total = line + Money::from_cents(500);      // 26.98
//! assert_eq!(total.cents(), 2698);
//! ```
//!
//! Operators saturate at the `i64` bounds. Sale and order planning use the
//! `checked_*` methods and reject amounts that do not fit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleLine.price_cents ──► TransactionItem.subtotal ──► Transaction.total│
/// │                                                                         │
/// │  OrderLine.unit_price ──► OrderItem.subtotal ──────► Order.total        │
/// │                                                                         │
/// │  Product.stock × Product.cost ──────────────────► inventory value      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
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

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    ///
    /// Saturates at the `i64` bounds; use [`Money::checked_multiply_quantity`]
    /// where an out-of-range amount must be rejected.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Divides the amount evenly across `count` parts, rounding half away
    /// from zero to the nearest cent. Returns zero when `count` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::money::Money;
    ///
    /// // 10.00 over 3 sales = 3.333.. → 3.33
    /// assert_eq!(Money::from_cents(1000).average(3).cents(), 333);
    /// // 10.00 over 6 sales = 1.666.. → 1.67
    /// assert_eq!(Money::from_cents(1000).average(6).cents(), 167);
    /// assert_eq!(Money::from_cents(1000).average(0).cents(), 0);
    /// ```
    pub fn average(&self, count: i64) -> Money {
        if count == 0 {
            return Money::zero();
        }

        // i128 keeps `2 * amount` from overflowing on huge totals
        let amount = self.0 as i128;
        let count = count as i128;
        let half_up = (2 * amount.abs() + count.abs()) / (2 * count.abs());
        let sign = if (amount < 0) != (count < 0) { -1 } else { 1 };

        Money((half_up * sign) as i64)
    }

    /// Formats the amount prefixed by a currency code, e.g. `USD 10.99`.
    pub fn format_with(&self, currency: &str) -> String {
        format!("{} {}", currency, self)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the plain decimal amount (`10.99`, `-5.50`).
///
/// ## Note
/// Currency symbols are a presentation concern; use [`Money::format_with`]
/// when a code is needed.
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
