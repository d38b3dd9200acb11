//! Transactions module - the append-only ledger types and traits.

mod transactions_model;
mod transactions_traits;

// Re-export the public interface
pub use transactions_model::{NewTransactionRecord, TransactionKind, TransactionRecord};
pub use transactions_traits::TransactionLogTrait;
