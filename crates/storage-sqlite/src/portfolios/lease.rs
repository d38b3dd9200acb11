//! Per-portfolio lock registry backing the exclusive-lease contract.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per portfolio id.
///
/// Locks are created on first use and kept for the life of the registry;
/// a portfolio that was ever mutated keeps its (tiny) entry. The guard
/// returned by `acquire` travels inside `PortfolioLease`, so it is held for
/// the whole load-mutate-persist sequence and released on commit or drop.
#[derive(Default)]
pub struct LeaseRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock for `portfolio_id` is free and returns the
    /// owned guard.
    pub async fn acquire(&self, portfolio_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out of the map before awaiting so the shard lock is
        // not held across the await point.
        let lock = self
            .locks
            .entry(portfolio_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
