//! Adapts quote providers to the domain's `Price` type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use folioledger_market_data::errors::MarketDataError;
use folioledger_market_data::provider::QuoteProvider;

use crate::errors::Result;
use crate::money::Price;
use crate::portfolios::Ticker;

use super::market_data_traits::PriceSourceTrait;

/// Price source backed by a `QuoteProvider` from the market-data crate.
///
/// Quotes are converted to `Price` values in the portfolio base currency;
/// a quote in any other currency is rejected (currency conversion is out of
/// scope).
pub struct PriceSourceService {
    provider: Arc<dyn QuoteProvider>,
    base_currency: String,
}

impl PriceSourceService {
    /// Creates a new PriceSourceService instance.
    pub fn new(provider: Arc<dyn QuoteProvider>, base_currency: String) -> Self {
        Self {
            provider,
            base_currency,
        }
    }

    fn to_price(&self, symbol: &str, close: rust_decimal::Decimal, currency: &str) -> Result<Price> {
        if currency != self.base_currency {
            return Err(MarketDataError::InvalidData(format!(
                "quote for {} is in {}, expected {}",
                symbol, currency, self.base_currency
            ))
            .into());
        }
        Price::new(close, currency)
    }
}

#[async_trait]
impl PriceSourceTrait for PriceSourceService {
    async fn current_price(&self, ticker: &Ticker) -> Result<Price> {
        debug!(
            "Fetching current price for {} from {}",
            ticker,
            self.provider.id()
        );
        let quote = self.provider.latest_quote(ticker.as_str()).await?;
        self.to_price(ticker.as_str(), quote.close, &quote.currency)
    }

    async fn current_prices(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Price>> {
        let symbols: Vec<String> = tickers.iter().map(|t| t.as_str().to_string()).collect();
        let quotes = self.provider.latest_quotes(&symbols).await?;

        let mut prices = HashMap::with_capacity(tickers.len());
        for ticker in tickers {
            let quote = quotes.get(ticker.as_str()).ok_or_else(|| {
                MarketDataError::NotFound(ticker.as_str().to_string())
            })?;
            let price = self.to_price(ticker.as_str(), quote.close, &quote.currency)?;
            prices.insert(ticker.clone(), price);
        }
        Ok(prices)
    }
}
