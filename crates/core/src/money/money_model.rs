//! Monetary value objects.
//!
//! `Money` and `Price` are immutable decimal amounts tagged with a currency.
//! All accounting arithmetic goes through `rust_decimal` - floats never touch
//! a balance or a cost basis. Amounts are rounded to `DECIMAL_PRECISION`
//! places on construction, so every derived value is already normalized.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Error, Result, ValidationError};
use crate::portfolios::{PortfolioError, ShareQuantity};
use crate::utils::decimal_serde::decimal_serde;

/// A non-negative amount of cash in a single currency.
///
/// Signed deltas (realized profit may be negative) are plain `Decimal`
/// values; `Money` itself never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    #[serde(with = "decimal_serde")]
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Creates a new amount, rounded to two decimal places.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Result<Self> {
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "currency".to_string(),
            )));
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Money amount cannot be negative: {}",
                amount
            ))));
        }
        Ok(Self {
            amount: amount.round_dp(DECIMAL_PRECISION),
            currency,
        })
    }

    /// A zero balance in the given currency.
    pub fn zero(currency: impl Into<String>) -> Result<Self> {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns `self + other`. Currencies must match.
    pub fn add(&self, other: &Money) -> Result<Money> {
        self.assert_same_currency(other)?;
        Money::new(self.amount + other.amount, self.currency.clone())
    }

    /// Returns `self - other`. Currencies must match and the result may not
    /// go negative; callers check available funds before subtracting, so an
    /// underflow here is an aggregate bug, not user error.
    pub fn sub(&self, other: &Money) -> Result<Money> {
        self.assert_same_currency(other)?;
        if other.amount > self.amount {
            return Err(PortfolioError::InvariantViolation(format!(
                "balance underflow: {} - {}",
                self, other
            ))
            .into());
        }
        Money::new(self.amount - other.amount, self.currency.clone())
    }

    /// True when this amount can cover `other`.
    pub fn covers(&self, other: &Money) -> Result<bool> {
        self.assert_same_currency(other)?;
        Ok(self.amount >= other.amount)
    }

    fn assert_same_currency(&self, other: &Money) -> Result<()> {
        if self.currency != other.currency {
            return Err(PortfolioError::InvariantViolation(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            ))
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.amount.round_dp(DECIMAL_PRECISION),
            self.currency
        )
    }
}

/// A per-share price in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(with = "decimal_serde")]
    amount: Decimal,
    currency: String,
}

impl Price {
    /// Creates a new price, rounded to two decimal places.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Result<Self> {
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "currency".to_string(),
            )));
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Price cannot be negative: {}",
                amount
            ))));
        }
        Ok(Self {
            amount: amount.round_dp(DECIMAL_PRECISION),
            currency,
        })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Total cost of `quantity` shares at this price.
    pub fn times(&self, quantity: ShareQuantity) -> Result<Money> {
        Money::new(
            self.amount * Decimal::from(quantity.get()),
            self.currency.clone(),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.amount.round_dp(DECIMAL_PRECISION),
            self.currency
        )
    }
}
