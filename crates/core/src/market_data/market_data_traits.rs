//! Price source traits.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::Result;
use crate::money::Price;
use crate::portfolios::Ticker;

/// Trait defining the contract for current-price lookup.
///
/// The core does not retry failed lookups - retry policy, if any, belongs
/// to the provider behind the implementation.
#[async_trait]
pub trait PriceSourceTrait: Send + Sync {
    /// Returns the current market price for one ticker.
    async fn current_price(&self, ticker: &Ticker) -> Result<Price>;

    /// Returns current market prices for a set of tickers.
    async fn current_prices(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Price>>;
}
