//! Shared test fixtures: a temp-file SQLite database with migrations
//! applied and a writer actor running.

use std::sync::Arc;

use tempfile::TempDir;

use folioledger_storage_sqlite::db::{create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle};
use folioledger_storage_sqlite::{PortfolioRepository, TransactionLogRepository};

pub struct TestDb {
    // Held so the database file outlives the test.
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

impl TestDb {
    /// Creates a fresh database in a temp directory. Must run inside a
    /// tokio runtime (the writer actor is a spawned task).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = init(dir.path().to_str().expect("utf-8 temp path")).expect("init database");
        let pool = create_pool(&db_path).expect("create pool");
        run_migrations(&pool).expect("run migrations");
        let writer = spawn_writer((*pool).clone());
        Self {
            _dir: dir,
            pool,
            writer,
        }
    }

    pub fn portfolio_repository(&self) -> PortfolioRepository {
        PortfolioRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn transaction_log(&self) -> TransactionLogRepository {
        TransactionLogRepository::new(self.pool.clone(), self.writer.clone())
    }
}
