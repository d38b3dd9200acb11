//! Portfolios module - the aggregate, its services, and traits.

mod portfolios_errors;
mod portfolios_model;
mod portfolios_service;
mod portfolios_traits;


#[cfg(test)]
mod portfolios_service_tests;

// Re-export the public interface
pub use portfolios_errors::PortfolioError;
pub use portfolios_model::{Holding, Lot, Portfolio, SellResult, ShareQuantity, Ticker};
pub use portfolios_service::PortfolioService;
pub use portfolios_traits::{PortfolioLease, PortfolioRepositoryTrait, PortfolioServiceTrait};
