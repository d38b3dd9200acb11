//! Market data module - price lookup traits and provider adapter.

mod market_data_service;
mod market_data_traits;

// Re-export the public interface
pub use market_data_service::PriceSourceService;
pub use market_data_traits::PriceSourceTrait;

// Re-export the provider error type for convenience
pub use folioledger_market_data::errors::MarketDataError;
