//! Single-writer actor for SQLite.
//!
//! SQLite allows only one writer at a time; funneling every write through
//! one dedicated connection avoids `SQLITE_BUSY` churn under concurrent
//! load. Each job runs inside an immediate transaction, so a job either
//! commits fully or leaves the database untouched.

use std::any::Any;

use diesel::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

use folioledger_core::errors::Result;

use super::DbPool;
use crate::errors::StorageError;

// The job executed by the writer actor: a closure over one mutable
// connection, type-erased so jobs with different return types share a
// channel.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    #[allow(clippy::type_complexity)]
    tx: mpsc::Sender<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
    )>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection,
    /// inside an immediate transaction.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .expect("Writer actor's receiving channel was closed, indicating the actor stopped.");

        ret_rx
            .await
            .expect("Writer actor dropped the reply sender without sending a result.")
            .map(|boxed: Box<dyn Any + Send + 'static>| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("Failed to downcast writer actor result."))
            })
    }
}

/// Spawns a background Tokio task that acts as the single writer to the
/// database. The actor owns one connection from the pool and processes
/// write jobs serially.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    #[allow(clippy::type_complexity)]
    let (tx, mut rx) = mpsc::channel::<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
    )>(1024);

    tokio::spawn(async move {
        // This connection is held for the lifetime of the actor.
        let mut conn = pool.get().expect(
            "Failed to get a connection from the DB pool for the writer actor. \
             The pool might be exhausted or misconfigured.",
        );

        while let Some((job, reply_tx)) = rx.recv().await {
            // Run the job inside an immediate transaction. StorageError
            // implements the conversions both ways, so core errors survive
            // the round trip in string form.
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // Ignore error if the receiver has dropped (e.g. the request
            // was cancelled).
            let _ = reply_tx.send(result);
        }
        // rx.recv() returned None: every WriteHandle was dropped, the actor
        // can terminate.
    });

    WriteHandle { tx }
}
