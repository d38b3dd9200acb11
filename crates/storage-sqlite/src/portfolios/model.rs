//! Database models for the portfolio aggregate.
//!
//! Three tables back one aggregate: `portfolios`, `holdings`, and `lots`.
//! Decimal amounts are stored as text to keep them exact; the `position`
//! column on lots records insertion order explicitly, because purchase
//! timestamps may tie inside one serialized burst of buys and FIFO order
//! must survive the round trip.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use folioledger_core::errors::{DatabaseError, Error, Result};
use folioledger_core::money::{Money, Price};
use folioledger_core::portfolios::{Holding, Lot, Portfolio, ShareQuantity, Ticker};

/// Database model for portfolios
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioDB {
    pub id: String,
    pub owner_name: String,
    pub currency: String,
    pub balance: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for holdings
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(PortfolioDB, foreign_key = portfolio_id))]
pub struct HoldingDB {
    pub id: String,
    pub portfolio_id: String,
    pub ticker: String,
    pub created_at: NaiveDateTime,
}

/// Database model for lots
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::lots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(HoldingDB, foreign_key = holding_id))]
pub struct LotDB {
    pub id: String,
    pub holding_id: String,
    pub position: i32,
    pub initial_quantity: i64,
    pub remaining_quantity: i64,
    pub unit_price: String,
    pub purchased_at: NaiveDateTime,
}

fn parse_decimal(raw: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "stored {} is not a decimal ({}): {}",
            what, raw, e
        )))
    })
}

fn parse_quantity(raw: i64, what: &str) -> Result<ShareQuantity> {
    let count = u64::try_from(raw).map_err(|_| {
        Error::Database(DatabaseError::Internal(format!(
            "stored {} is negative: {}",
            what, raw
        )))
    })?;
    Ok(ShareQuantity::new(count))
}

fn quantity_column(quantity: ShareQuantity, what: &str) -> Result<i64> {
    i64::try_from(quantity.get()).map_err(|_| {
        Error::Database(DatabaseError::Internal(format!(
            "{} out of column range: {}",
            what, quantity
        )))
    })
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}

impl From<&Portfolio> for PortfolioDB {
    fn from(portfolio: &Portfolio) -> Self {
        Self {
            id: portfolio.id().to_string(),
            owner_name: portfolio.owner_name().to_string(),
            currency: portfolio.currency().to_string(),
            balance: portfolio.balance().amount().to_string(),
            created_at: portfolio.created_at().naive_utc(),
            updated_at: portfolio.updated_at().naive_utc(),
        }
    }
}

/// Flattens the aggregate into its three row sets for persistence.
pub fn rows_from_portfolio(
    portfolio: &Portfolio,
) -> Result<(PortfolioDB, Vec<HoldingDB>, Vec<LotDB>)> {
    let portfolio_row = PortfolioDB::from(portfolio);
    let mut holding_rows = Vec::new();
    let mut lot_rows = Vec::new();

    for holding in portfolio.holdings() {
        let created_at = holding
            .lots()
            .first()
            .map(|lot| lot.purchased_at().naive_utc())
            .unwrap_or(portfolio_row.updated_at);
        holding_rows.push(HoldingDB {
            id: holding.id().to_string(),
            portfolio_id: portfolio.id().to_string(),
            ticker: holding.ticker().to_string(),
            created_at,
        });
        for (position, lot) in holding.lots().iter().enumerate() {
            lot_rows.push(LotDB {
                id: lot.id().to_string(),
                holding_id: holding.id().to_string(),
                position: position as i32,
                initial_quantity: quantity_column(lot.initial(), "lot initial quantity")?,
                remaining_quantity: quantity_column(lot.remaining(), "lot remaining quantity")?,
                unit_price: lot.unit_price().amount().to_string(),
                purchased_at: lot.purchased_at().naive_utc(),
            });
        }
    }

    Ok((portfolio_row, holding_rows, lot_rows))
}

/// Rebuilds the aggregate from its rows. Lots must arrive in `position`
/// order within each holding.
pub fn portfolio_from_rows(
    portfolio_row: PortfolioDB,
    holdings_with_lots: Vec<(HoldingDB, Vec<LotDB>)>,
) -> Result<Portfolio> {
    let balance = Money::new(
        parse_decimal(&portfolio_row.balance, "balance")?,
        portfolio_row.currency.clone(),
    )?;

    let mut holdings = Vec::with_capacity(holdings_with_lots.len());
    for (holding_row, lot_rows) in holdings_with_lots {
        let ticker = Ticker::parse(&holding_row.ticker)?;
        let mut lots = Vec::with_capacity(lot_rows.len());
        for lot_row in lot_rows {
            let unit_price = Price::new(
                parse_decimal(&lot_row.unit_price, "lot unit price")?,
                portfolio_row.currency.clone(),
            )?;
            lots.push(Lot::from_parts(
                lot_row.id,
                parse_quantity(lot_row.initial_quantity, "lot initial quantity")?,
                parse_quantity(lot_row.remaining_quantity, "lot remaining quantity")?,
                unit_price,
                utc(lot_row.purchased_at),
            )?);
        }
        holdings.push(Holding::from_parts(holding_row.id, ticker, lots));
    }

    Portfolio::from_parts(
        portfolio_row.id,
        portfolio_row.owner_name,
        balance,
        holdings,
        utc(portfolio_row.created_at),
        utc(portfolio_row.updated_at),
    )
}
