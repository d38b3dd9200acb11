//! Use-case layer for portfolio operations.
//!
//! Each mutating operation runs one load-mutate-persist sequence: acquire
//! the exclusive lease, apply exactly one aggregate method, and commit the
//! new state together with its ledger record through `save`. If anything
//! fails before `save`, the lease drops and nothing is persisted.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::market_data::PriceSourceTrait;
use crate::money::Money;
use crate::transactions::{
    NewTransactionRecord, TransactionKind, TransactionLogTrait, TransactionRecord,
};

use super::portfolios_errors::PortfolioError;
use super::portfolios_model::{Portfolio, SellResult, ShareQuantity, Ticker};
use super::portfolios_traits::{
    PortfolioRepositoryTrait, PortfolioServiceTrait,
};

/// Service for managing portfolios.
pub struct PortfolioService {
    repository: Arc<dyn PortfolioRepositoryTrait>,
    ledger: Arc<dyn TransactionLogTrait>,
    price_source: Arc<dyn PriceSourceTrait>,
    base_currency: String,
}

impl PortfolioService {
    /// Creates a new PortfolioService instance.
    pub fn new(
        repository: Arc<dyn PortfolioRepositoryTrait>,
        ledger: Arc<dyn TransactionLogTrait>,
        price_source: Arc<dyn PriceSourceTrait>,
        base_currency: String,
    ) -> Self {
        Self {
            repository,
            ledger,
            price_source,
            base_currency,
        }
    }

    /// Converts a raw cash amount into `Money`, rejecting non-positive
    /// input before `Money`'s own non-negative check can mask the sign.
    fn positive_amount(&self, amount: Decimal, operation: &str) -> Result<Money> {
        if amount <= Decimal::ZERO {
            return Err(PortfolioError::InvalidAmount(format!(
                "{} amount must be positive, got {}",
                operation, amount
            ))
            .into());
        }
        Money::new(amount, self.base_currency.clone())
    }

    fn positive_quantity(quantity: u64, operation: &str) -> Result<ShareQuantity> {
        if quantity == 0 {
            return Err(PortfolioError::InvalidQuantity(format!(
                "{} quantity must be positive",
                operation
            ))
            .into());
        }
        Ok(ShareQuantity::new(quantity))
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn create_portfolio(&self, owner_name: &str) -> Result<Portfolio> {
        debug!("Creating portfolio for owner: {}", owner_name);
        let portfolio = Portfolio::create(owner_name, &self.base_currency)?;
        self.repository.create(portfolio).await
    }

    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio> {
        self.repository.get_by_id(portfolio_id)
    }

    fn list_portfolios(&self) -> Result<Vec<Portfolio>> {
        self.repository.list()
    }

    async fn deposit(&self, portfolio_id: &str, amount: Decimal) -> Result<Portfolio> {
        let amount = self.positive_amount(amount, "deposit")?;

        let mut lease = self.repository.acquire_exclusive(portfolio_id).await?;
        lease.deposit(&amount)?;
        let updated = lease.portfolio().clone();

        let entry = NewTransactionRecord::deposit(portfolio_id, amount);
        self.repository.save(lease, entry).await?;
        Ok(updated)
    }

    async fn withdraw(&self, portfolio_id: &str, amount: Decimal) -> Result<Portfolio> {
        let amount = self.positive_amount(amount, "withdrawal")?;

        let mut lease = self.repository.acquire_exclusive(portfolio_id).await?;
        lease.withdraw(&amount)?;
        let updated = lease.portfolio().clone();

        let entry = NewTransactionRecord::withdrawal(portfolio_id, amount);
        self.repository.save(lease, entry).await?;
        Ok(updated)
    }

    async fn buy(&self, portfolio_id: &str, ticker: &str, quantity: u64) -> Result<Portfolio> {
        let ticker = Ticker::parse(ticker)?;
        let quantity = Self::positive_quantity(quantity, "buy")?;

        // Price resolution happens before the lease is taken; a slow or
        // failing provider must not block other writers on this portfolio.
        let price = self.price_source.current_price(&ticker).await?;
        debug!("Buying {} x {} @ {}", quantity, ticker, price);

        let mut lease = self.repository.acquire_exclusive(portfolio_id).await?;
        let total_cost = lease.buy(&ticker, quantity, price.clone())?;
        let updated = lease.portfolio().clone();

        let entry = NewTransactionRecord::buy(portfolio_id, ticker, quantity, price, total_cost);
        self.repository.save(lease, entry).await?;
        Ok(updated)
    }

    async fn sell(&self, portfolio_id: &str, ticker: &str, quantity: u64) -> Result<SellResult> {
        let ticker = Ticker::parse(ticker)?;
        let quantity = Self::positive_quantity(quantity, "sell")?;

        let price = self.price_source.current_price(&ticker).await?;
        debug!("Selling {} x {} @ {}", quantity, ticker, price);

        let mut lease = self.repository.acquire_exclusive(portfolio_id).await?;
        let result = lease.sell(&ticker, quantity, price.clone())?;

        let entry = NewTransactionRecord::sell(portfolio_id, ticker, quantity, price, &result);
        self.repository.save(lease, entry).await?;
        Ok(result)
    }

    fn list_transactions(
        &self,
        portfolio_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<TransactionRecord>> {
        // Surface a portfolio-not-found error rather than an empty list.
        self.repository.get_by_id(portfolio_id)?;
        self.ledger.list_by_portfolio(portfolio_id, kind)
    }
}
