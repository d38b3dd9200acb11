use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point-in-time market data quote for one symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol the quote is for
    pub symbol: String,

    /// Timestamp of the quote
    pub timestamp: DateTime<Utc>,

    /// Closing/current price
    pub close: Decimal,

    /// Quote currency
    pub currency: String,

    /// Source of the quote (MANUAL, YAHOO, ...)
    pub source: String,
}

impl Quote {
    /// Create a new quote
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        close: Decimal,
        currency: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            close,
            currency: currency.into(),
            source: source.into(),
        }
    }
}
