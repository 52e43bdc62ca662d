//! Read path for transaction status: cache first, durable store on any cache error.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::TransactionStatus;
use crate::ports::{CacheError, RepositoryError, StatusCache, TransactionRepository};

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("status source unavailable: {0}")]
    Unavailable(String),
}

/// A single place a status can be read from.
#[async_trait]
pub trait StatusLookup: Send + Sync {
    async fn lookup(&self, transaction_id: &str) -> Result<TransactionStatus, LookupError>;
}

pub struct CacheLookup(pub Arc<dyn StatusCache>);

#[async_trait]
impl StatusLookup for CacheLookup {
    async fn lookup(&self, transaction_id: &str) -> Result<TransactionStatus, LookupError> {
        self.0.get_status(transaction_id).await.map_err(|e| match e {
            CacheError::Miss(id) => LookupError::NotFound(id),
            other => LookupError::Unavailable(other.to_string()),
        })
    }
}

pub struct StoreLookup(pub Arc<dyn TransactionRepository>);

#[async_trait]
impl StatusLookup for StoreLookup {
    async fn lookup(&self, transaction_id: &str) -> Result<TransactionStatus, LookupError> {
        match self.0.get_by_id(transaction_id).await {
            Ok(tx) => Ok(tx.status),
            Err(RepositoryError::NotFound(id)) => Err(LookupError::NotFound(id)),
            Err(e) => Err(LookupError::Unavailable(e.to_string())),
        }
    }
}

/// Returns a cache hit as-is and never re-checks it against the store.
/// Callers needing a strongly consistent read go to the repository directly.
#[derive(Clone)]
pub struct StatusResolver {
    primary: Arc<dyn StatusLookup>,
    fallback: Arc<dyn StatusLookup>,
}

impl StatusResolver {
    pub fn new(primary: Arc<dyn StatusLookup>, fallback: Arc<dyn StatusLookup>) -> Self {
        Self { primary, fallback }
    }

    pub fn cache_then_store(
        cache: Arc<dyn StatusCache>,
        store: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self::new(Arc::new(CacheLookup(cache)), Arc::new(StoreLookup(store)))
    }

    pub async fn get_status(&self, transaction_id: &str) -> Result<TransactionStatus, LookupError> {
        match self.primary.lookup(transaction_id).await {
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::debug!(transaction_id, "Status cache lookup failed, reading store: {}", e);
                self.fallback.lookup(transaction_id).await
            }
        }
    }
}
