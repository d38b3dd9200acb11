//! Market data error types.

use thiserror::Error;

/// Errors surfaced by quote providers.
///
/// The core treats any of these as "external price unavailable" and does
/// not retry; retry policy, if any, belongs to the provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider {provider} error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("No quote available for symbol: {0}")]
    NotFound(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
