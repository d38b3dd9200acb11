//! Repository for the portfolio aggregate.
//!
//! `acquire_exclusive` takes the per-id lock *before* loading, and `save`
//! holds it until the write actor has committed both the aggregate state
//! and the ledger record. Between those two points the lease guard lives
//! inside the `PortfolioLease` value, so a caller cannot accidentally
//! mutate a portfolio it has not leased.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use log::debug;

use folioledger_core::errors::Result;
use folioledger_core::portfolios::{
    Portfolio, PortfolioError, PortfolioLease, PortfolioRepositoryTrait,
};
use folioledger_core::transactions::{NewTransactionRecord, TransactionRecord};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::DieselErrorExt;
use crate::schema::{holdings, lots, portfolios};
use crate::transactions::{append_in_transaction, materialize_record};

use super::lease::LeaseRegistry;
use super::model::{portfolio_from_rows, rows_from_portfolio, HoldingDB, LotDB, PortfolioDB};

/// Repository for managing portfolio aggregates in the database.
///
/// One instance per process: the lease registry inside it is what
/// serializes concurrent mutations of the same portfolio.
pub struct PortfolioRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    leases: LeaseRegistry,
}

impl PortfolioRepository {
    /// Creates a new PortfolioRepository instance
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self {
            pool,
            writer,
            leases: LeaseRegistry::new(),
        }
    }

    fn find_row(conn: &mut SqliteConnection, portfolio_id: &str) -> Result<PortfolioDB> {
        portfolios::table
            .find(portfolio_id)
            .select(PortfolioDB::as_select())
            .first::<PortfolioDB>(conn)
            .map_err(|e| match e {
                DieselError::NotFound => {
                    PortfolioError::NotFound(portfolio_id.to_string()).into()
                }
                _ => e.into_core_error(),
            })
    }

    /// Loads the full aggregate for one portfolio row.
    fn load_aggregate(conn: &mut SqliteConnection, row: PortfolioDB) -> Result<Portfolio> {
        let holding_rows = HoldingDB::belonging_to(&row)
            .select(HoldingDB::as_select())
            .order(holdings::created_at.asc())
            .load::<HoldingDB>(conn)
            .map_err(|e| e.into_core_error())?;

        let lot_rows = LotDB::belonging_to(&holding_rows)
            .select(LotDB::as_select())
            .order(lots::position.asc())
            .load::<LotDB>(conn)
            .map_err(|e| e.into_core_error())?;

        let grouped = lot_rows.grouped_by(&holding_rows);
        portfolio_from_rows(row, holding_rows.into_iter().zip(grouped).collect())
    }

    fn load_by_id(conn: &mut SqliteConnection, portfolio_id: &str) -> Result<Portfolio> {
        let row = Self::find_row(conn, portfolio_id)?;
        Self::load_aggregate(conn, row)
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for PortfolioRepository {
    async fn create(&self, portfolio: Portfolio) -> Result<Portfolio> {
        let row = PortfolioDB::from(&portfolio);
        debug!("Creating portfolio {} for {}", row.id, row.owner_name);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(portfolios::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(|e| e.into_core_error())?;
                Ok(())
            })
            .await?;
        Ok(portfolio)
    }

    async fn acquire_exclusive(&self, portfolio_id: &str) -> Result<PortfolioLease> {
        let guard = self.leases.acquire(portfolio_id).await;
        // Load only after the lock is held, so the lease observes the state
        // left by whichever operation committed last.
        let mut conn = get_connection(&self.pool)?;
        let portfolio = Self::load_by_id(&mut conn, portfolio_id)?;
        Ok(PortfolioLease::new(portfolio, guard))
    }

    async fn save(
        &self,
        lease: PortfolioLease,
        entry: NewTransactionRecord,
    ) -> Result<TransactionRecord> {
        let (portfolio, guard) = lease.into_parts();
        let (portfolio_row, holding_rows, lot_rows) = rows_from_portfolio(&portfolio)?;
        let record = materialize_record(entry);
        let record_for_insert = record.clone();
        let portfolio_id = portfolio_row.id.clone();

        let result = self
            .writer
            .exec(move |conn| {
                diesel::update(portfolios::table.find(&portfolio_id))
                    .set(&portfolio_row)
                    .execute(conn)
                    .map_err(|e| e.into_core_error())?;

                // Replace the full holdings/lots state. Deleting holdings
                // cascades to their lots (foreign_keys is ON).
                diesel::delete(holdings::table.filter(holdings::portfolio_id.eq(&portfolio_id)))
                    .execute(conn)
                    .map_err(|e| e.into_core_error())?;
                diesel::insert_into(holdings::table)
                    .values(&holding_rows)
                    .execute(conn)
                    .map_err(|e| e.into_core_error())?;
                diesel::insert_into(lots::table)
                    .values(&lot_rows)
                    .execute(conn)
                    .map_err(|e| e.into_core_error())?;

                append_in_transaction(conn, &record_for_insert)
            })
            .await;

        // The lease is released only once the unit of work has committed or
        // rolled back.
        drop(guard);
        result?;
        Ok(record)
    }

    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;
        Self::load_by_id(&mut conn, portfolio_id)
    }

    fn list(&self) -> Result<Vec<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = portfolios::table
            .select(PortfolioDB::as_select())
            .order(portfolios::created_at.asc())
            .load::<PortfolioDB>(&mut conn)
            .map_err(|e| e.into_core_error())?;

        rows.into_iter()
            .map(|row| Self::load_aggregate(&mut conn, row))
            .collect()
    }
}
