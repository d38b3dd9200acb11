//! Yahoo Finance market data provider.
//!
//! Fetches latest quotes from the public v8 chart endpoint. The chart
//! endpoint needs no crumb/cookie authentication, which keeps this provider
//! a single GET per symbol.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use num_traits::FromPrimitive;
use reqwest::header;
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::Quote;

use super::traits::QuoteProvider;

use models::{ChartMeta, ChartResponse};

pub const DATA_SOURCE_YAHOO: &str = "YAHOO";

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MarketDataError::ProviderError {
                provider: DATA_SOURCE_YAHOO.to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different host. Test hook.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn provider_error(&self, message: String) -> MarketDataError {
        MarketDataError::ProviderError {
            provider: DATA_SOURCE_YAHOO.to_string(),
            message,
        }
    }

    fn quote_from_meta(&self, symbol: &str, meta: &ChartMeta) -> Result<Quote, MarketDataError> {
        let price = meta
            .regular_market_price
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;
        let close = Decimal::from_f64(price).ok_or_else(|| {
            MarketDataError::ParsingError(format!("unrepresentable price for {}: {}", symbol, price))
        })?;
        let currency = meta
            .currency
            .clone()
            .ok_or_else(|| MarketDataError::InvalidData(format!("quote for {} has no currency", symbol)))?;
        let timestamp = meta
            .regular_market_time
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now);
        Ok(Quote::new(symbol, timestamp, close, currency, DATA_SOURCE_YAHOO))
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        DATA_SOURCE_YAHOO
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!(symbol, "fetching yahoo chart quote");

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited(DATA_SOURCE_YAHOO.to_string()));
        }
        if !response.status().is_success() {
            return Err(self.provider_error(format!(
                "chart request for {} failed with status {}",
                symbol,
                response.status()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;

        if let Some(error) = body.chart.error {
            return Err(self.provider_error(format!("{}: {}", error.code, error.description)));
        }
        let result = body
            .chart
            .result
            .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;

        self.quote_from_meta(symbol, &result.meta)
    }
}
