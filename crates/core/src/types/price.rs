//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as plain JSON numbers in the store currency
//! (rupees, not paise). They are parsed into [`Decimal`] so cart totals never
//! accumulate floating point error, and serialized back as numbers.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A unit price or total in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from minor units (paise, cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply the price by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Amount in minor units, rounded half away from zero.
    ///
    /// Payment gateways expect integer paise.
    #[must_use]
    pub fn to_minor(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Format for display with the given currency (e.g., "₹1299.00").
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
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

/// ISO 4217 currency codes the storefront can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_json_numbers() {
        let price: Price = serde_json::from_str("1299.5").unwrap();
        assert_eq!(price, Price::from_minor(129_950));

        let whole: Price = serde_json::from_str("499").unwrap();
        assert_eq!(whole, Price::from_minor(49_900));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_minor(49_950)).unwrap();
        assert_eq!(json, "499.5");
    }

    #[test]
    fn test_times_and_sum_are_exact() {
        let lines = [Price::from_minor(10), Price::from_minor(20)];
        let total: Price = lines.iter().map(|p| p.times(3)).sum();
        assert_eq!(total, Price::from_minor(90));
    }

    #[test]
    fn test_to_minor_rounds() {
        assert_eq!(Price::from_minor(129_999).to_minor(), Some(129_999));
        let third = Price::new(Decimal::new(10_005, 3)); // 10.005
        assert_eq!(third.to_minor(), Some(1001));
    }

    #[test]
    fn test_display_with_currency() {
        let price = Price::from_minor(129_900);
        assert_eq!(price.display(CurrencyCode::INR), "₹1299.00");
        assert_eq!(price.display(CurrencyCode::USD), "$1299.00");
        assert_eq!(price.to_string(), "1299.00");
    }
}
