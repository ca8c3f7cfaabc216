//! Euro prices with exact decimal arithmetic.
//!
//! Shop prices are stored VAT-exclusive. VAT is applied on the cart subtotal,
//! never per line, so rounding only ever happens when a value is displayed or
//! converted to cents for the payment processor.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Spanish general VAT rate (21%).
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// A euro amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero euros.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount in euros.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The exact underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The VAT owed on this amount, unrounded.
    #[must_use]
    pub fn vat(&self) -> Self {
        Self(self.0 * VAT_RATE)
    }

    /// This amount with VAT added, unrounded.
    #[must_use]
    pub fn with_vat(&self) -> Self {
        Self(self.0 * (Decimal::ONE + VAT_RATE))
    }

    /// The amount rounded half away from zero to whole cents.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// The amount in whole cents, as the payment processor expects it.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_cents(&self) -> Option<i64> {
        (self.rounded().0 * Decimal::ONE_HUNDRED).to_i64()
    }

    /// Format for display, e.g. `"87.12 €"`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2} €", self.rounded().0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_is_exact() {
        let subtotal = Price::from_cents(7200);
        assert_eq!(subtotal.vat().amount(), Decimal::new(1512, 2));
        assert_eq!(subtotal.with_vat().amount(), Decimal::new(8712, 2));
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Price::new(Decimal::new(10005, 3)).display(), "10.01 €");
        assert_eq!(Price::from_cents(1999).display(), "19.99 €");
        assert_eq!(Price::ZERO.display(), "0.00 €");
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(Price::new(Decimal::new(87_125, 3)).to_cents(), Some(8713));
        assert_eq!(Price::from_cents(500).to_cents(), Some(500));
    }

    #[test]
    fn test_line_multiplication_and_sum() {
        let total: Price = [Price::from_cents(1200) * 2, Price::from_cents(1800) * 1]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(4200));
    }
}
