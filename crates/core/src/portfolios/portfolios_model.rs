//! The portfolio aggregate and its building blocks.
//!
//! `Portfolio` is the aggregate root: all mutations to cash or holdings go
//! through its methods, and every method either fully succeeds or returns an
//! error with state unchanged. `Holding` owns the FIFO sell algorithm;
//! `Lot` tracks one purchase batch. Lots, holdings and portfolios are
//! entities - equality is by identifier, not by field values.
//!
//! The aggregate is not internally thread-safe. Exactly one logical writer
//! may operate on a given instance at a time; serialization across
//! concurrent requests is the storage layer's lease contract
//! (see `portfolios_traits`).

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::money::{Money, Price};
use crate::utils::decimal_serde::decimal_serde;

use super::portfolios_errors::PortfolioError;

/// A normalized stock symbol.
///
/// Trimmed and uppercased on construction; compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Parses and normalizes a raw symbol.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "ticker".to_string(),
            )));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid ticker symbol: {}",
                raw
            ))));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A count of whole shares. Fractional shares are out of scope.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShareQuantity(u64);

impl ShareQuantity {
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ShareQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One purchase batch of shares.
///
/// Created at purchase time with `remaining == initial`; afterwards the only
/// legal mutation is `reduce`, which never re-increases the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    id: String,
    initial: ShareQuantity,
    remaining: ShareQuantity,
    unit_price: Price,
    purchased_at: DateTime<Utc>,
}

impl Lot {
    /// Creates a fresh lot for a purchase of `quantity` shares.
    pub fn open(quantity: ShareQuantity, unit_price: Price, purchased_at: DateTime<Utc>) -> Result<Self> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "lot quantity must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            initial: quantity,
            remaining: quantity,
            unit_price,
            purchased_at,
        })
    }

    /// Rehydrates a lot from persisted state. Used by storage adapters.
    pub fn from_parts(
        id: String,
        initial: ShareQuantity,
        remaining: ShareQuantity,
        unit_price: Price,
        purchased_at: DateTime<Utc>,
    ) -> Result<Self> {
        if remaining > initial {
            return Err(PortfolioError::InvariantViolation(format!(
                "lot {}: remaining {} exceeds initial {}",
                id, remaining, initial
            ))
            .into());
        }
        Ok(Self {
            id,
            initial,
            remaining,
            unit_price,
            purchased_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial(&self) -> ShareQuantity {
        self.initial
    }

    pub fn remaining(&self) -> ShareQuantity {
        self.remaining
    }

    pub fn unit_price(&self) -> &Price {
        &self.unit_price
    }

    pub fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Releases `quantity` shares from this lot.
    ///
    /// `quantity` must be positive and no greater than `remaining`. The
    /// upper bound is the calling `Holding`'s responsibility - exceeding it
    /// is an invariant violation, not user error.
    pub fn reduce(&mut self, quantity: ShareQuantity) -> Result<()> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "reduce quantity must be positive".to_string(),
            )
            .into());
        }
        if quantity > self.remaining {
            return Err(PortfolioError::InvariantViolation(format!(
                "lot {}: cannot release {} of {} remaining shares",
                self.id, quantity, self.remaining
            ))
            .into());
        }
        self.remaining = ShareQuantity::new(self.remaining.get() - quantity.get());
        Ok(())
    }
}

impl PartialEq for Lot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Lot {}

/// Outcome of one completed sale.
///
/// Transient: derived during the sale and folded into the transaction
/// record, never persisted on its own. `profit` is signed - a sale below
/// cost basis is a loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellResult {
    pub proceeds: Money,
    pub cost_basis: Money,
    #[serde(with = "decimal_serde")]
    pub profit: Decimal,
}

/// The full position in one ticker: an ordered sequence of lots.
///
/// Vec order is purchase order and defines FIFO precedence. Exhausted lots
/// are retained; pruning them would change how history replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    id: String,
    ticker: Ticker,
    lots: Vec<Lot>,
}

impl Holding {
    /// Creates an empty position for `ticker`.
    pub fn open(ticker: Ticker) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticker,
            lots: Vec::new(),
        }
    }

    /// Rehydrates a holding from persisted state. `lots` must already be in
    /// purchase order. Used by storage adapters.
    pub fn from_parts(id: String, ticker: Ticker, lots: Vec<Lot>) -> Self {
        Self { id, ticker, lots }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Total shares currently held: sum of `remaining` over all lots.
    ///
    /// Recomputed on demand - no cached counter to drift out of sync.
    pub fn total_shares(&self) -> ShareQuantity {
        ShareQuantity::new(self.lots.iter().map(|lot| lot.remaining().get()).sum())
    }

    /// Records a purchase by appending a new lot, timestamped at call time.
    pub fn buy(&mut self, quantity: ShareQuantity, unit_price: Price) -> Result<()> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "buy quantity must be positive".to_string(),
            )
            .into());
        }
        let lot = Lot::open(quantity, unit_price, Utc::now())?;
        self.lots.push(lot);
        Ok(())
    }

    /// Sells `quantity` shares FIFO and returns proceeds, cost basis and
    /// realized profit.
    ///
    /// Lots are consumed strictly in purchase order, oldest first; exhausted
    /// lots are skipped. Validation happens before any lot is touched, so a
    /// failed sale leaves every `remaining` unchanged.
    pub fn sell(&mut self, quantity: ShareQuantity, sell_price: Price) -> Result<SellResult> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "sell quantity must be positive".to_string(),
            )
            .into());
        }
        let held = self.total_shares();
        if quantity > held {
            return Err(PortfolioError::ConflictQuantity(format!(
                "{}: requested {} but only {} held",
                self.ticker, quantity, held
            ))
            .into());
        }

        let mut still_needed = quantity.get();
        let mut cost_basis = Decimal::ZERO;
        for lot in self.lots.iter_mut() {
            if still_needed == 0 {
                break;
            }
            if lot.is_exhausted() {
                continue;
            }
            let consumed = lot.remaining().get().min(still_needed);
            cost_basis += lot.unit_price().amount() * Decimal::from(consumed);
            lot.reduce(ShareQuantity::new(consumed))?;
            still_needed -= consumed;
        }

        let proceeds = sell_price.times(quantity)?;
        let cost_basis = Money::new(cost_basis, sell_price.currency())?;
        let profit = proceeds.amount() - cost_basis.amount();
        Ok(SellResult {
            proceeds,
            cost_basis,
            profit,
        })
    }
}

impl PartialEq for Holding {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Holding {}

/// The aggregate root: cash balance plus one holding per ticker.
///
/// Invariants: balance never negative; at most one holding per ticker;
/// every mutation is all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    id: String,
    owner_name: String,
    balance: Money,
    holdings: HashMap<Ticker, Holding>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Portfolio {
    /// Creates a new portfolio with a generated id, zero balance and no
    /// holdings.
    pub fn create(owner_name: &str, currency: &str) -> Result<Self> {
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "ownerName".to_string(),
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_name: owner_name.to_string(),
            balance: Money::zero(currency)?,
            holdings: HashMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a portfolio from persisted state. Used by storage
    /// adapters.
    pub fn from_parts(
        id: String,
        owner_name: String,
        balance: Money,
        holdings: Vec<Holding>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut by_ticker = HashMap::with_capacity(holdings.len());
        for holding in holdings {
            if by_ticker
                .insert(holding.ticker().clone(), holding)
                .is_some()
            {
                return Err(PortfolioError::InvariantViolation(format!(
                    "portfolio {}: duplicate holding ticker",
                    id
                ))
                .into());
            }
        }
        Ok(Self {
            id,
            owner_name,
            balance,
            holdings: by_ticker,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn currency(&self) -> &str {
        self.balance.currency()
    }

    pub fn holding(&self, ticker: &Ticker) -> Option<&Holding> {
        self.holdings.get(ticker)
    }

    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Adds `amount` to the cash balance.
    pub fn deposit(&mut self, amount: &Money) -> Result<()> {
        if amount.is_zero() {
            return Err(PortfolioError::InvalidAmount(
                "deposit amount must be positive".to_string(),
            )
            .into());
        }
        self.balance = self.balance.add(amount)?;
        self.touch();
        Ok(())
    }

    /// Removes `amount` from the cash balance.
    pub fn withdraw(&mut self, amount: &Money) -> Result<()> {
        if amount.is_zero() {
            return Err(PortfolioError::InvalidAmount(
                "withdrawal amount must be positive".to_string(),
            )
            .into());
        }
        if !self.balance.covers(amount)? {
            return Err(PortfolioError::InsufficientFunds(format!(
                "withdrawal of {} exceeds balance {}",
                amount, self.balance
            ))
            .into());
        }
        self.balance = self.balance.sub(amount)?;
        self.touch();
        Ok(())
    }

    /// Buys `quantity` shares of `ticker` at `price`, deducting the total
    /// cost from the balance. Returns the total cost.
    ///
    /// The holding is created lazily on the first purchase of a ticker.
    /// All validation happens before the holding or the balance is touched.
    pub fn buy(
        &mut self,
        ticker: &Ticker,
        quantity: ShareQuantity,
        price: Price,
    ) -> Result<Money> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "buy quantity must be positive".to_string(),
            )
            .into());
        }
        let total_cost = price.times(quantity)?;
        if !self.balance.covers(&total_cost)? {
            return Err(PortfolioError::InsufficientFunds(format!(
                "purchase of {} exceeds balance {}",
                total_cost, self.balance
            ))
            .into());
        }

        let holding = self
            .holdings
            .entry(ticker.clone())
            .or_insert_with(|| Holding::open(ticker.clone()));
        holding.buy(quantity, price)?;
        self.balance = self.balance.sub(&total_cost)?;
        self.touch();
        Ok(total_cost)
    }

    /// Sells `quantity` shares of `ticker` at `price` FIFO, crediting the
    /// proceeds to the balance.
    pub fn sell(
        &mut self,
        ticker: &Ticker,
        quantity: ShareQuantity,
        price: Price,
    ) -> Result<SellResult> {
        if quantity.is_zero() {
            return Err(PortfolioError::InvalidQuantity(
                "sell quantity must be positive".to_string(),
            )
            .into());
        }
        let holding = self
            .holdings
            .get_mut(ticker)
            .ok_or_else(|| PortfolioError::HoldingNotFound(ticker.to_string()))?;
        let result = holding.sell(quantity, price)?;
        self.balance = self.balance.add(&result.proceeds)?;
        self.touch();
        Ok(result)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Portfolio {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Portfolio {}
