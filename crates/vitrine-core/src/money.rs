//! # Money Module
//!
//! Provides the `Money` type for handling prices safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Upstream sends:  "PRECO2": 19.9                                        │
//! │  As f64:          19.899999999999998578915...                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Convert ONCE at the sync boundary → 1990 cents                       │
//! │    Store cents, compare cents, render back to 19.90 only for output    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::money::Money;
//!
//! let price = Money::from_decimal(19.9).unwrap();
//! assert_eq!(price.cents(), 1990);
//! assert_eq!(price.to_decimal(), 19.9);
//! assert_eq!(price.to_string(), "R$ 19,90");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// A non-negative price in centavos.
///
/// ## Where Money is Used
/// ```text
/// upstream PRECO2 / PRECO1 ──► Money::from_decimal ──► products.*_cents
///                                                          │
///                          search output price ◄── to_decimal()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts an upstream decimal amount into cents.
    ///
    /// Rounds half away from zero to the nearest centavo.
    ///
    /// ## Errors
    /// `CoreError::InvalidPrice` for negative, NaN or infinite amounts.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(10.999).unwrap().cents(), 1100);
    /// assert!(Money::from_decimal(-1.0).is_err());
    /// ```
    pub fn from_decimal(amount: f64) -> CoreResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::InvalidPrice {
                field: "amount".to_string(),
                value: amount.to_string(),
            });
        }

        let cents = (amount * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(CoreError::InvalidPrice {
                field: "amount".to_string(),
                value: amount.to_string(),
            });
        }

        Ok(Money(cents as i64))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a 2-decimal number for JSON output.
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the reais (major unit) portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
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
}

/// Brazilian display format, for logs and the seed tool.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {},{:02}", self.reais(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        assert_eq!(Money::from_decimal(19.9).unwrap().cents(), 1990);
        assert_eq!(Money::from_decimal(0.005).unwrap().cents(), 1);
        assert_eq!(Money::from_decimal(0.0).unwrap().cents(), 0);
        assert_eq!(Money::from_decimal(129.994).unwrap().cents(), 12999);
    }

    #[test]
    fn test_from_decimal_rejects_invalid() {
        assert!(Money::from_decimal(-0.01).is_err());
        assert!(Money::from_decimal(f64::NAN).is_err());
        assert!(Money::from_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(1099).to_decimal(), 10.99);
        assert_eq!(Money::zero().to_decimal(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5,00");
        assert_eq!(Money::zero().to_string(), "R$ 0,00");
    }
}
