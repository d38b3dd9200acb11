//! Transaction ledger traits.

use async_trait::async_trait;

use crate::errors::Result;

use super::transactions_model::{NewTransactionRecord, TransactionKind, TransactionRecord};

/// Trait defining the contract for the append-only transaction ledger.
///
/// Records are never updated or deleted. Appends that accompany an
/// aggregate mutation go through `PortfolioRepositoryTrait::save` instead,
/// so that record and state change commit together.
#[async_trait]
pub trait TransactionLogTrait: Send + Sync {
    /// Appends one record, assigning id and timestamp.
    async fn append(&self, entry: NewTransactionRecord) -> Result<TransactionRecord>;

    /// Lists a portfolio's records in append order, optionally filtered by
    /// kind.
    fn list_by_portfolio(
        &self,
        portfolio_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<TransactionRecord>>;
}
