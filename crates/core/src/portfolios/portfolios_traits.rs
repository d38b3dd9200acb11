//! Portfolio repository and service traits, and the exclusive-lease guard.
//!
//! These traits define the contract for portfolio operations without any
//! database-specific types, allowing for different storage implementations.
//! The concurrency contract lives here as a type: `PortfolioLease` carries
//! the per-portfolio lock for the whole load-mutate-persist sequence, so
//! holding the lease is structural rather than a calling convention.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use crate::errors::Result;
use crate::transactions::{NewTransactionRecord, TransactionKind, TransactionRecord};

use super::portfolios_model::{Portfolio, SellResult};

/// Exclusive write access to one portfolio.
///
/// Obtained from `PortfolioRepositoryTrait::acquire_exclusive` and consumed
/// by `save`. The embedded guard serializes all mutating sequences on the
/// same portfolio id; dropping the lease without saving releases the lock
/// with nothing persisted (rollback).
pub struct PortfolioLease {
    portfolio: Portfolio,
    guard: OwnedMutexGuard<()>,
}

impl PortfolioLease {
    /// Wraps a freshly loaded portfolio together with its id lock.
    ///
    /// Only repository implementations construct leases.
    pub fn new(portfolio: Portfolio, guard: OwnedMutexGuard<()>) -> Self {
        Self { portfolio, guard }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    /// Splits the lease into the mutated portfolio and the still-held
    /// guard. Repository `save` implementations keep the guard alive until
    /// the enclosing unit of work commits.
    pub fn into_parts(self) -> (Portfolio, OwnedMutexGuard<()>) {
        (self.portfolio, self.guard)
    }
}

impl Deref for PortfolioLease {
    type Target = Portfolio;

    fn deref(&self) -> &Portfolio {
        &self.portfolio
    }
}

impl DerefMut for PortfolioLease {
    fn deref_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }
}

/// Trait defining the contract for portfolio repository operations.
///
/// Implementations persist the full aggregate state and provide the
/// exclusive-lease serialization described on `PortfolioLease`.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    /// Persists a newly created portfolio.
    async fn create(&self, portfolio: Portfolio) -> Result<Portfolio>;

    /// Loads the portfolio under an exclusive lease, blocking until any
    /// in-flight operation on the same id has committed or rolled back.
    async fn acquire_exclusive(&self, portfolio_id: &str) -> Result<PortfolioLease>;

    /// Commits one unit of work: persists the aggregate's current state and
    /// appends the transaction record atomically, then releases the lease.
    async fn save(
        &self,
        lease: PortfolioLease,
        entry: NewTransactionRecord,
    ) -> Result<TransactionRecord>;

    /// Read-only load, no lease taken.
    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio>;

    /// Lists all portfolios.
    fn list(&self) -> Result<Vec<Portfolio>>;
}

/// Trait defining the contract for portfolio service operations.
///
/// The service layer handles price resolution and the
/// load-mutate-persist-record sequence; amounts arrive as raw decimals from
/// the caller and are validated here.
#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    /// Creates a new portfolio for `owner_name` with a zero balance.
    async fn create_portfolio(&self, owner_name: &str) -> Result<Portfolio>;

    /// Retrieves a portfolio by id.
    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio>;

    /// Lists all portfolios.
    fn list_portfolios(&self) -> Result<Vec<Portfolio>>;

    /// Deposits `amount` of cash, returning the updated portfolio.
    async fn deposit(&self, portfolio_id: &str, amount: Decimal) -> Result<Portfolio>;

    /// Withdraws `amount` of cash, returning the updated portfolio.
    async fn withdraw(&self, portfolio_id: &str, amount: Decimal) -> Result<Portfolio>;

    /// Buys `quantity` shares of `ticker` at the current market price.
    async fn buy(&self, portfolio_id: &str, ticker: &str, quantity: u64) -> Result<Portfolio>;

    /// Sells `quantity` shares of `ticker` at the current market price.
    async fn sell(&self, portfolio_id: &str, ticker: &str, quantity: u64) -> Result<SellResult>;

    /// Lists a portfolio's ledger records, optionally filtered by kind.
    fn list_transactions(
        &self,
        portfolio_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<TransactionRecord>>;
}
