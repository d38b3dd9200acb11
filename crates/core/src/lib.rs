//! Folioledger Core - Domain entities, services, and traits.
//!
//! This crate contains the portfolio accounting business logic:
//! the `Portfolio` aggregate with FIFO lot accounting, the value objects
//! it is built from, and the append-only transaction ledger types.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod market_data;
pub mod money;
pub mod portfolios;
pub mod transactions;
pub mod utils;

// Re-export common types from the money and portfolio modules
pub use money::*;
pub use portfolios::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
