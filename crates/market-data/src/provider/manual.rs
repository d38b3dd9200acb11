//! Manual quote provider.
//!
//! Serves fixed, caller-supplied quotes. Used in tests and wherever an
//! external source is unavailable or undesirable.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::Quote;

use super::traits::QuoteProvider;

pub const DATA_SOURCE_MANUAL: &str = "MANUAL";

/// A provider backed by an in-memory symbol -> price table.
#[derive(Default)]
pub struct ManualProvider {
    prices: HashMap<String, (Decimal, String)>,
}

impl ManualProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the price served for `symbol`.
    pub fn set_price(&mut self, symbol: &str, price: Decimal, currency: &str) {
        self.prices
            .insert(symbol.to_string(), (price, currency.to_string()));
    }

    /// Builder-style variant of `set_price`.
    pub fn with_price(mut self, symbol: &str, price: Decimal, currency: &str) -> Self {
        self.set_price(symbol, price, currency);
        self
    }
}

#[async_trait]
impl QuoteProvider for ManualProvider {
    fn id(&self) -> &'static str {
        DATA_SOURCE_MANUAL
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let (price, currency) = self
            .prices
            .get(symbol)
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;
        Ok(Quote::new(
            symbol,
            Utc::now(),
            *price,
            currency.clone(),
            DATA_SOURCE_MANUAL,
        ))
    }
}
