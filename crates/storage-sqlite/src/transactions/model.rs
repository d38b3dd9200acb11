//! Database model for ledger records.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use folioledger_core::errors::{DatabaseError, Error, Result};
use folioledger_core::money::{Money, Price};
use folioledger_core::portfolios::{ShareQuantity, Ticker};
use folioledger_core::transactions::{NewTransactionRecord, TransactionKind, TransactionRecord};

/// Database model for transactions
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRecordDB {
    pub id: String,
    pub portfolio_id: String,
    pub kind: String,
    pub currency: String,
    pub ticker: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<String>,
    pub total_amount: String,
    pub profit: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Turns an input entry into a full record, assigning id and timestamp.
/// The ledger is the single place where record identity is minted.
pub fn materialize_record(entry: NewTransactionRecord) -> TransactionRecord {
    TransactionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        portfolio_id: entry.portfolio_id,
        kind: entry.kind,
        ticker: entry.ticker,
        quantity: entry.quantity,
        unit_price: entry.unit_price,
        total_amount: entry.total_amount,
        profit: entry.profit,
        created_at: Utc::now(),
    }
}

impl TryFrom<&TransactionRecord> for TransactionRecordDB {
    type Error = Error;

    fn try_from(record: &TransactionRecord) -> Result<Self> {
        let quantity = record
            .quantity
            .map(|q| {
                i64::try_from(q.get()).map_err(|_| {
                    Error::Database(DatabaseError::Internal(format!(
                        "transaction quantity out of column range: {}",
                        q
                    )))
                })
            })
            .transpose()?;
        Ok(Self {
            id: record.id.clone(),
            portfolio_id: record.portfolio_id.clone(),
            kind: record.kind.as_str().to_string(),
            currency: record.total_amount.currency().to_string(),
            ticker: record.ticker.as_ref().map(|t| t.to_string()),
            quantity,
            unit_price: record.unit_price.as_ref().map(|p| p.amount().to_string()),
            total_amount: record.total_amount.amount().to_string(),
            profit: record.profit.map(|p| p.to_string()),
            created_at: record.created_at.naive_utc(),
        })
    }
}

impl TryFrom<TransactionRecordDB> for TransactionRecord {
    type Error = Error;

    fn try_from(row: TransactionRecordDB) -> Result<Self> {
        let parse = |raw: &str, what: &str| -> Result<Decimal> {
            Decimal::from_str(raw).map_err(|e| {
                Error::Database(DatabaseError::Internal(format!(
                    "stored {} is not a decimal ({}): {}",
                    what, raw, e
                )))
            })
        };

        let kind = TransactionKind::from_str(&row.kind)?;
        let ticker = row.ticker.as_deref().map(Ticker::parse).transpose()?;
        let quantity = row
            .quantity
            .map(|q| {
                u64::try_from(q).map_err(|_| {
                    Error::Database(DatabaseError::Internal(format!(
                        "stored transaction quantity is negative: {}",
                        q
                    )))
                })
            })
            .transpose()?
            .map(ShareQuantity::new);
        let unit_price = row
            .unit_price
            .as_deref()
            .map(|raw| parse(raw, "unit price").and_then(|d| Price::new(d, row.currency.clone())))
            .transpose()?;
        let total_amount = Money::new(
            parse(&row.total_amount, "total amount")?,
            row.currency.clone(),
        )?;
        let profit = row
            .profit
            .as_deref()
            .map(|raw| parse(raw, "profit"))
            .transpose()?;

        Ok(Self {
            id: row.id,
            portfolio_id: row.portfolio_id,
            kind,
            ticker,
            quantity,
            unit_price,
            total_amount,
            profit,
            created_at: DateTime::<Utc>::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}
