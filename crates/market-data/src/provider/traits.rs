//! Quote provider trait definition.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Trait for current-price providers.
///
/// Implement this trait to add support for a new market data source.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO" or "MANUAL". Used for
    /// logging and as the `source` tag on returned quotes.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for a symbol.
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch the latest quotes for several symbols.
    ///
    /// The default implementation fetches sequentially; providers with a
    /// batch endpoint should override it.
    async fn latest_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Quote>, MarketDataError> {
        let mut quotes = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let quote = self.latest_quote(symbol).await?;
            quotes.insert(symbol.clone(), quote);
        }
        Ok(quotes)
    }
}
