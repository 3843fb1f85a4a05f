//! Currency-precision monetary amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use super::ValidationError;

/// Number of decimal places kept for every amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Non-negative amount with two decimal places.
///
/// Prices and totals are always computed server side; the wrapped decimal is
/// normalised to [`CURRENCY_SCALE`] so `12.9` and `12.90` compare equal and
/// render identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub fn zero() -> Self {
        Self(Decimal::new(0, CURRENCY_SCALE))
    }

    /// Creates an amount, rejecting negatives and sub-cent precision.
    pub fn from_decimal(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::invalid_format(
                "amount",
                "must not be negative",
            ));
        }
        let normalized = amount.normalize();
        if normalized.scale() > CURRENCY_SCALE {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("at most {} decimal places allowed", CURRENCY_SCALE),
            ));
        }
        let mut scaled = normalized;
        scaled.rescale(CURRENCY_SCALE);
        Ok(Self(scaled))
    }

    /// Creates an amount from minor units (cents).
    pub fn from_minor_units(cents: i64) -> Result<Self, ValidationError> {
        Self::from_decimal(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Returns the inner decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Converts to minor units (cents) for the payment gateway.
    pub fn to_minor_units(&self) -> Result<i64, ValidationError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .ok_or_else(|| ValidationError::invalid_format("amount", "too large for minor units"))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        // Both sides already have scale 2 and are non-negative.
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_decimal_normalizes_scale() {
        let a = Money::from_decimal(dec!(12.9)).unwrap();
        let b = Money::from_decimal(dec!(12.90)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "12.90");
    }

    #[test]
    fn from_decimal_rejects_negative() {
        assert!(Money::from_decimal(dec!(-0.01)).is_err());
    }

    #[test]
    fn from_decimal_rejects_sub_cent_precision() {
        assert!(Money::from_decimal(dec!(1.005)).is_err());
    }

    #[test]
    fn trailing_zeros_beyond_scale_are_accepted() {
        let m = Money::from_decimal(dec!(4.5000)).unwrap();
        assert_eq!(m.to_string(), "4.50");
    }

    #[test]
    fn minor_units_of_twelve_ninety_nine() {
        let m = Money::from_decimal(dec!(12.99)).unwrap();
        assert_eq!(m.to_minor_units().unwrap(), 1299);
    }

    #[test]
    fn sum_of_prices() {
        let total: Money = [dec!(12.99), dec!(7.01), dec!(0.50)]
            .into_iter()
            .map(|d| Money::from_decimal(d).unwrap())
            .sum();
        assert_eq!(total, Money::from_decimal(dec!(20.50)).unwrap());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let m = Money::from_decimal(dec!(12.99)).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"12.99\"");
    }

    #[test]
    fn deserialize_rejects_negative() {
        let result: Result<Money, _> = serde_json::from_str("\"-1.00\"");
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn minor_units_round_trip(cents in 0i64..10_000_000_000) {
            let m = Money::from_minor_units(cents).unwrap();
            prop_assert_eq!(m.to_minor_units().unwrap(), cents);
        }

        #[test]
        fn sum_matches_minor_unit_sum(values in proptest::collection::vec(0i64..1_000_000, 0..20)) {
            let total: Money = values
                .iter()
                .map(|c| Money::from_minor_units(*c).unwrap())
                .sum();
            prop_assert_eq!(total.to_minor_units().unwrap(), values.iter().sum::<i64>());
        }
    }
}
