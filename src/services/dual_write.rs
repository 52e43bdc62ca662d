//! Writes transaction facts to the durable store and the status cache.
//!
//! The store is the source of truth: its failures are returned to the
//! caller. Cache failures are logged and swallowed; reads fall back to the
//! store (see `StatusResolver`).

use std::sync::Arc;

use crate::domain::{Transaction, TransactionStatus};
use crate::ports::{CacheResult, RepositoryError, StatusCache, TransactionRepository};

#[derive(Clone)]
pub struct DualWriteCoordinator {
    store: Arc<dyn TransactionRepository>,
    cache: Arc<dyn StatusCache>,
}

/// Outcome of a conditional terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalize {
    Applied,
    /// The stored status that blocked the transition.
    AlreadyFinal(TransactionStatus),
}

impl DualWriteCoordinator {
    pub fn new(store: Arc<dyn TransactionRepository>, cache: Arc<dyn StatusCache>) -> Self {
        Self { store, cache }
    }

    /// Inserts the row and caches its status concurrently.
    pub async fn write_transaction(&self, tx: &Transaction) -> Result<(), RepositoryError> {
        let (stored, cached) = tokio::join!(
            self.store.insert(tx),
            self.cache.set_status(&tx.transaction_id, tx.status),
        );

        log_cache_failure(&tx.transaction_id, cached);
        stored
    }

    /// Overwrites the status in both places concurrently.
    pub async fn update_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<(), RepositoryError> {
        let (stored, cached) = tokio::join!(
            self.store.update_status(transaction_id, status),
            self.cache.set_status(transaction_id, status),
        );

        log_cache_failure(transaction_id, cached);
        stored
    }

    /// Moves a pending transaction to `status` atomically in the store.
    ///
    /// The cache is written only after the store accepted the transition, so
    /// a losing concurrent callback never leaves its status in the cache.
    pub async fn finalize_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<Finalize, RepositoryError> {
        if !self.store.finalize_status(transaction_id, status).await? {
            let current = self.store.get_by_id(transaction_id).await?.status;
            return Ok(Finalize::AlreadyFinal(current));
        }

        log_cache_failure(transaction_id, self.cache.set_status(transaction_id, status).await);
        Ok(Finalize::Applied)
    }
}

fn log_cache_failure(transaction_id: &str, result: CacheResult<()>) {
    if let Err(e) = result {
        tracing::warn!(transaction_id, "Failed to write status to cache: {}", e);
    }
}
