//! Collaborator contracts consumed by the services layer.
//!
//! The durable store, the status cache and the publisher are reached only
//! through these traits so each can be swapped for a fake in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Transaction, TransactionStatus};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// System of record for transactions.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<()>;

    async fn get_by_id(&self, transaction_id: &str) -> RepositoryResult<Transaction>;

    /// Unconditional status overwrite. `NotFound` when no row matched.
    async fn update_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<()>;

    /// Sets `status` only if the stored status is still `pending`.
    /// Returns `false` when the row exists but was already terminal.
    async fn finalize_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<bool>;
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache miss: {0}")]
    Miss(String),

    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("invalid cached value: {0}")]
    InvalidValue(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Volatile `transaction_id -> status` projection. Entries never expire.
#[async_trait]
pub trait StatusCache: Send + Sync {
    async fn set_status(&self, transaction_id: &str, status: TransactionStatus) -> CacheResult<()>;

    async fn get_status(&self, transaction_id: &str) -> CacheResult<TransactionStatus>;
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("publish rejected: {0}")]
    Rejected(String),
}

/// Hands accepted transactions to the downstream consumer.
#[async_trait]
pub trait TransactionPublisher: Send + Sync {
    async fn publish(
        &self,
        transaction_id: &str,
        payload: &[u8],
        data_format: &str,
    ) -> Result<(), PublishError>;
}
