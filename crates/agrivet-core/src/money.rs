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
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    ₱224.00 is stored as 22400 — exact, always                           │
//! │    Rounding happens once, explicitly, at tax/weight calculations        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use agrivet_core::money::Money;
//!
//! // Create from centavos (preferred)
//! let price = Money::from_cents(10000); // ₱100.00
//!
//! // Arithmetic operations
//! let doubled = price * 2;                       // ₱200.00
//! let total = price + Money::from_cents(2400);   // ₱124.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and over/short counts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use agrivet_core::money::Money;
    ///
    /// let price = Money::from_cents(10099); // ₱100.99
    /// assert_eq!(price.cents(), 10099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pesos) portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math with explicit rounding: `(amount * bps + 5000) / 10000`.
    /// The +5000 rounds the half-centavo case up.
    ///
    /// ## Example
    /// ```rust
    /// use agrivet_core::money::Money;
    /// use agrivet_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(20000); // ₱200.00
    /// let vat = subtotal.calculate_tax(TaxRate::from_bps(1200)); // 12% VAT
    /// assert_eq!(vat.cents(), 2400); // ₱24.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 to prevent overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a discrete quantity.
    ///
    /// ## Example
    /// ```rust
    /// use agrivet_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10000); // ₱100.00
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 20000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies a per-kilogram price by a weight in grams.
    ///
    /// Used for weight-priced products (feed sold by the kilo). Rounds the
    /// sub-centavo remainder to the nearest centavo.
    ///
    /// ## Example
    /// ```rust
    /// use agrivet_core::money::Money;
    ///
    /// let per_kg = Money::from_cents(4500);          // ₱45.00 / kg
    /// let total = per_kg.multiply_weight_grams(2500); // 2.5 kg
    /// assert_eq!(total.cents(), 11250);               // ₱112.50
    /// ```
    pub fn multiply_weight_grams(&self, grams: i64) -> Self {
        let total = (self.0 as i128 * grams as i128 + 500) / 1000;
        Money::from_cents(total as i64)
    }

    /// Subtracts a discount, flooring at zero.
    ///
    /// Line totals must never go negative (a discount larger than the line
    /// is clamped, not rejected, at the math layer — validation rejects it
    /// earlier for user input).
    #[inline]
    pub fn saturating_discount(&self, discount: Money) -> Self {
        Money((self.0 - discount.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and receipts. UI formatting/localization happens
/// elsewhere.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₱{}.{:02}", sign, self.pesos().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
