//! Non-negative currency amounts.
//!
//! Prices and sale totals are stored as `NUMERIC` and carried as
//! [`rust_decimal::Decimal`], so `price × quantity` sums are exact.

use core::fmt;
use core::iter::Sum;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is blank.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("'{0}' is not a valid amount")]
    NotANumber(String),
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more than two fractional digits.
    #[error("amount can have at most 2 decimal places")]
    TooPrecise,
}

/// A non-negative amount in the store's currency.
///
/// ```
/// use campus_mart_core::Money;
///
/// let price: Money = "3.50".parse().unwrap();
/// assert_eq!(price.times(3).to_string(), "$10.50");
/// assert!("-1".parse::<Money>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for amounts below zero and
    /// [`MoneyError::TooPrecise`] for sub-cent amounts.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(MoneyError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Build an amount from whole cents.
    ///
    /// Negative input is clamped to zero.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents.max(0), 2))
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This amount multiplied by a unit count.
    ///
    /// Non-positive quantities yield zero.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Self {
        if quantity <= 0 {
            return Self::ZERO;
        }
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        let amount = Decimal::from_str(trimmed).map_err(|_| MoneyError::NotANumber(s.to_owned()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_dollar_prefixed_amounts() {
        assert_eq!("12.99".parse::<Money>().unwrap(), Money::from_cents(1299));
        assert_eq!("$1.5".parse::<Money>().unwrap(), Money::from_cents(150));
        assert_eq!("0".parse::<Money>().unwrap(), Money::ZERO);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Money>(), Err(MoneyError::Empty));
        assert_eq!("-0.01".parse::<Money>(), Err(MoneyError::Negative));
        assert_eq!("1.005".parse::<Money>(), Err(MoneyError::TooPrecise));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::NotANumber(_))));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert!("2.5000".parse::<Money>().is_ok());
    }

    #[test]
    fn multiplication_is_exact() {
        // 0.1 * 3 would drift in binary floating point
        let dime = Money::from_cents(10);
        assert_eq!(dime.times(3), Money::from_cents(30));
        assert_eq!(dime.times(0), Money::ZERO);
    }

    #[test]
    fn sums_and_formats() {
        let total: Money = [Money::from_cents(350), Money::from_cents(299)].iter().sum();
        assert_eq!(total.to_string(), "$6.49");
    }

    #[test]
    fn deserialization_enforces_invariants() {
        let ok: Money = serde_json::from_str("\"4.25\"").unwrap();
        assert_eq!(ok, Money::from_cents(425));
        assert!(serde_json::from_str::<Money>("\"-4.25\"").is_err());
    }
}
