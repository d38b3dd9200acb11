//! The append-only transaction ledger types.
//!
//! A `TransactionRecord` captures one completed portfolio operation. Records
//! live outside the aggregate's consistency boundary - the ledger is
//! unbounded and queried independently - but each record is appended in the
//! same unit of work that persists the mutation it describes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};
use crate::money::{Money, Price};
use crate::portfolios::{SellResult, ShareQuantity, Ticker};
use crate::utils::decimal_serde::decimal_serde_option;

/// The kind of operation a ledger record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Buy,
    Sell,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" => Ok(TransactionKind::Withdrawal),
            "BUY" => Ok(TransactionKind::Buy),
            "SELL" => Ok(TransactionKind::Sell),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown transaction kind: {}",
                other
            )))),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one completed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub portfolio_id: String,
    pub kind: TransactionKind,
    pub ticker: Option<Ticker>,
    pub quantity: Option<ShareQuantity>,
    pub unit_price: Option<Price>,
    pub total_amount: Money,
    #[serde(with = "decimal_serde_option")]
    pub profit: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Input model for appending a ledger record.
///
/// Id and timestamp are assigned by the ledger on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRecord {
    pub portfolio_id: String,
    pub kind: TransactionKind,
    pub ticker: Option<Ticker>,
    pub quantity: Option<ShareQuantity>,
    pub unit_price: Option<Price>,
    pub total_amount: Money,
    #[serde(with = "decimal_serde_option")]
    pub profit: Option<Decimal>,
}

impl NewTransactionRecord {
    pub fn deposit(portfolio_id: &str, amount: Money) -> Self {
        Self {
            portfolio_id: portfolio_id.to_string(),
            kind: TransactionKind::Deposit,
            ticker: None,
            quantity: None,
            unit_price: None,
            total_amount: amount,
            profit: None,
        }
    }

    pub fn withdrawal(portfolio_id: &str, amount: Money) -> Self {
        Self {
            portfolio_id: portfolio_id.to_string(),
            kind: TransactionKind::Withdrawal,
            ticker: None,
            quantity: None,
            unit_price: None,
            total_amount: amount,
            profit: None,
        }
    }

    pub fn buy(
        portfolio_id: &str,
        ticker: Ticker,
        quantity: ShareQuantity,
        unit_price: Price,
        total_cost: Money,
    ) -> Self {
        Self {
            portfolio_id: portfolio_id.to_string(),
            kind: TransactionKind::Buy,
            ticker: Some(ticker),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            total_amount: total_cost,
            profit: None,
        }
    }

    pub fn sell(
        portfolio_id: &str,
        ticker: Ticker,
        quantity: ShareQuantity,
        unit_price: Price,
        result: &SellResult,
    ) -> Self {
        Self {
            portfolio_id: portfolio_id.to_string(),
            kind: TransactionKind::Sell,
            ticker: Some(ticker),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            total_amount: result.proceeds.clone(),
            profit: Some(result.profit),
        }
    }
}
