//! Error type for portfolio aggregate operations.

use thiserror::Error;

/// Custom error type for portfolio-related operations.
///
/// Every variant except `InvariantViolation` is a caller error: the
/// aggregate raises it at the point of violation and leaves state
/// untouched. `InvariantViolation` signals a bug inside the aggregate
/// itself (e.g. a lot asked to release more shares than it holds).
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Sell quantity exceeds held shares: {0}")]
    ConflictQuantity(String),

    #[error("No holding for ticker: {0}")]
    HoldingNotFound(String),

    #[error("Portfolio not found: {0}")]
    NotFound(String),

    #[error("Aggregate invariant violated: {0}")]
    InvariantViolation(String),
}
