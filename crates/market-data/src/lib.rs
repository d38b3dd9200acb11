//! Folioledger Market Data Crate
//!
//! Provider-agnostic current-price fetching for the portfolio core.
//!
//! # Overview
//!
//! The crate exposes a small surface:
//!
//! - [`Quote`] - a point-in-time price for one symbol
//! - [`provider::QuoteProvider`] - the trait every price source implements
//! - [`provider::YahooProvider`] - quotes from the Yahoo Finance chart API
//! - [`provider::ManualProvider`] - fixed in-memory quotes for tests and
//!   offline use
//!
//! The portfolio core consumes providers through its own `PriceSourceTrait`
//! adapter; nothing in this crate knows about portfolios.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::Quote;
pub use provider::{ManualProvider, QuoteProvider, YahooProvider};
