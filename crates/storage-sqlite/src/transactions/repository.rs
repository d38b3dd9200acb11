//! Repository for the append-only transaction ledger.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use folioledger_core::errors::Result;
use folioledger_core::transactions::{
    NewTransactionRecord, TransactionKind, TransactionLogTrait, TransactionRecord,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::DieselErrorExt;
use crate::schema::transactions;

use super::model::{materialize_record, TransactionRecordDB};

/// Appends `record` inside an already-open transaction.
///
/// Used by the portfolio repository so that a mutation's state change and
/// its ledger record commit together.
pub fn append_in_transaction(
    conn: &mut SqliteConnection,
    record: &TransactionRecord,
) -> Result<()> {
    let row = TransactionRecordDB::try_from(record)?;
    diesel::insert_into(transactions::table)
        .values(&row)
        .execute(conn)
        .map_err(|e| e.into_core_error())?;
    Ok(())
}

/// Repository for reading and appending ledger records.
pub struct TransactionLogRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionLogRepository {
    /// Creates a new TransactionLogRepository instance
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TransactionLogTrait for TransactionLogRepository {
    async fn append(&self, entry: NewTransactionRecord) -> Result<TransactionRecord> {
        let record = materialize_record(entry);
        let for_insert = record.clone();
        self.writer
            .exec(move |conn| append_in_transaction(conn, &for_insert))
            .await?;
        Ok(record)
    }

    fn list_by_portfolio(
        &self,
        portfolio_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<TransactionRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = transactions::table
            .filter(transactions::portfolio_id.eq(portfolio_id))
            .into_boxed();

        if let Some(kind) = kind {
            query = query.filter(transactions::kind.eq(kind.as_str()));
        }

        let rows = query
            .select(TransactionRecordDB::as_select())
            .order(transactions::created_at.asc())
            .load::<TransactionRecordDB>(&mut conn)
            .map_err(|e| e.into_core_error())?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }
}
