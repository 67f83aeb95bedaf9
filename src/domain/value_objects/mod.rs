//! Value objects shared across the storefront domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(SkuError::Empty);
        }
        if value.len() > 50 {
            return Err(SkuError::TooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

/// Money value object. All storefront amounts share one deployment currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }

    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, "USD")
    }

    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }

    /// Rounded to cents, the precision everything is displayed and stored at.
    pub fn round2(&self) -> Money {
        Money::new(self.amount.round_dp(2), &self.currency)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero("USD")
    }
}

#[derive(Debug, Clone, Error)]
pub enum MoneyError {
    #[error("currency mismatch")]
    CurrencyMismatch,
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn add(&self, other: u32) -> Self {
        Self(self.0.saturating_add(other))
    }

    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 {
            None
        } else {
            Some(Self(self.0 - other))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Free-text cancellation/return reason. Must be non-empty after trimming;
/// submitting a blank reason is a validation error, not a silent default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason(String);

impl Reason {
    pub fn new(value: impl Into<String>) -> Result<Self, ReasonError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ReasonError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReasonError {
    #[error("a non-empty reason is required")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_normalizes() {
        let sku = Sku::new("  prod-001 ").unwrap();
        assert_eq!(sku.as_str(), "PROD-001");
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn money_add_and_multiply() {
        let a = Money::usd(Decimal::new(100, 0));
        let b = Money::usd(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert_eq!(a.multiply(3).amount(), Decimal::new(300, 0));
        let eur = Money::new(Decimal::ONE, "EUR");
        assert!(a.add(&eur).is_err());
    }

    #[test]
    fn reason_rejects_blank() {
        assert!(Reason::new("").is_err());
        assert!(Reason::new("   ").is_err());
        assert_eq!(Reason::new(" damaged on arrival ").unwrap().as_str(), "damaged on arrival");
    }
}
