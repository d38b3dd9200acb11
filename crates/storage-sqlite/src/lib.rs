//! SQLite storage implementation for Folioledger.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `folioledger-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The portfolio repository with its exclusive-lease registry
//! - The append-only transaction ledger repository
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. The core crate is database-agnostic and works with traits.
//!
//! All writes funnel through a single-writer actor holding one connection
//! (`db::write_actor`), each job inside an immediate transaction. Aggregate
//! mutations additionally hold the per-portfolio lease for the whole
//! load-mutate-persist sequence, so two requests for the same portfolio are
//! strictly serialized while different portfolios proceed in parallel.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod portfolios;
pub mod transactions;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{DieselErrorExt, StorageError};

// Re-export repositories
pub use portfolios::{LeaseRegistry, PortfolioRepository};
pub use transactions::TransactionLogRepository;

// Re-export from folioledger-core for convenience
pub use folioledger_core::errors::{DatabaseError, Error, Result};
