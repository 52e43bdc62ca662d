#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use payment_gateway_core::domain::{Transaction, TransactionKind, TransactionStatus};
use payment_gateway_core::ports::{
    CacheError, CacheResult, PublishError, RepositoryError, RepositoryResult, StatusCache,
    TransactionPublisher, TransactionRepository,
};
use payment_gateway_core::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use payment_gateway_core::services::{DualWriteCoordinator, StatusResolver, TransactionPipeline};

/// Sleeps for the configured number of milliseconds, if any.
async fn simulate_latency(latency_ms: &AtomicU64) {
    let ms = latency_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// In-memory durable store with call counters and failure injection.
///
/// `write_latency_ms` delays every write before it touches the rows. The
/// conditional finalize itself stays atomic, like the SQL `UPDATE`.
#[derive(Default)]
pub struct FakeRepository {
    rows: Mutex<HashMap<String, Transaction>>,
    pub write_latency_ms: AtomicU64,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    pub get_calls: AtomicUsize,
    pub mutations: AtomicUsize,
}

impl FakeRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, tx: Transaction) {
        self.rows.lock().unwrap().insert(tx.transaction_id.clone(), tx);
    }

    pub fn status_of(&self, transaction_id: &str) -> Option<TransactionStatus> {
        self.rows.lock().unwrap().get(transaction_id).map(|tx| tx.status)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows.lock().unwrap().keys().cloned().collect()
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn write_failure(&self) -> Option<RepositoryError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl TransactionRepository for FakeRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<()> {
        simulate_latency(&self.write_latency_ms).await;
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .insert(tx.transaction_id.clone(), tx.clone());
        Ok(())
    }

    async fn get_by_id(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.rows
            .lock()
            .unwrap()
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(transaction_id.to_string()))
    }

    async fn update_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<()> {
        simulate_latency(&self.write_latency_ms).await;
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(transaction_id)
            .ok_or_else(|| RepositoryError::NotFound(transaction_id.to_string()))?;
        row.status = status;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finalize_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<bool> {
        simulate_latency(&self.write_latency_ms).await;
        if let Some(e) = self.write_failure() {
            return Err(e);
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(transaction_id)
            .ok_or_else(|| RepositoryError::NotFound(transaction_id.to_string()))?;
        if row.status != TransactionStatus::Pending {
            return Ok(false);
        }
        row.status = status;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// In-memory status cache with call counters and failure injection.
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, TransactionStatus>>,
    pub write_latency_ms: AtomicU64,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
}

impl FakeCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, transaction_id: &str, status: TransactionStatus) {
        self.entries
            .lock()
            .unwrap()
            .insert(transaction_id.to_string(), status);
    }

    pub fn cached(&self, transaction_id: &str) -> Option<TransactionStatus> {
        self.entries.lock().unwrap().get(transaction_id).copied()
    }
}

fn cache_backend_error() -> CacheError {
    CacheError::Backend(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl StatusCache for FakeCache {
    async fn set_status(&self, transaction_id: &str, status: TransactionStatus) -> CacheResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        simulate_latency(&self.write_latency_ms).await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(cache_backend_error());
        }
        self.put(transaction_id, status);
        Ok(())
    }

    async fn get_status(&self, transaction_id: &str) -> CacheResult<TransactionStatus> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(cache_backend_error());
        }
        self.cached(transaction_id)
            .ok_or_else(|| CacheError::Miss(transaction_id.to_string()))
    }
}

/// Publisher that records what it was sent and the stored status at that moment.
pub struct FakePublisher {
    store: Arc<FakeRepository>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub published: Mutex<Vec<(String, String)>>,
    pub status_at_publish: Mutex<Vec<Option<TransactionStatus>>>,
}

impl FakePublisher {
    pub fn new(store: Arc<FakeRepository>) -> Arc<Self> {
        Arc::new(Self {
            store,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            status_at_publish: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionPublisher for FakePublisher {
    async fn publish(
        &self,
        transaction_id: &str,
        payload: &[u8],
        data_format: &str,
    ) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status_at_publish
            .lock()
            .unwrap()
            .push(self.store.status_of(transaction_id));

        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected("broker unavailable".to_string()));
        }

        assert!(!payload.is_empty());
        self.published
            .lock()
            .unwrap()
            .push((transaction_id.to_string(), data_format.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<FakeRepository>,
    pub cache: Arc<FakeCache>,
    pub publisher: Arc<FakePublisher>,
    pub breaker: Arc<CircuitBreaker>,
    pub pipeline: TransactionPipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_breaker(CircuitBreakerConfig {
            failure_threshold: 5,
            cool_down: Duration::from_secs(60),
        })
    }

    pub fn with_breaker(config: CircuitBreakerConfig) -> Self {
        let store = FakeRepository::new();
        let cache = FakeCache::new();
        let publisher = FakePublisher::new(store.clone());
        let breaker = Arc::new(CircuitBreaker::new("publisher", config));

        let coordinator = DualWriteCoordinator::new(store.clone(), cache.clone());
        let resolver = Arc::new(StatusResolver::cache_then_store(cache.clone(), store.clone()));
        let pipeline = TransactionPipeline::new(
            coordinator,
            resolver,
            publisher.clone(),
            breaker.clone(),
            RetryPolicy::immediate(3),
        );

        Self {
            store,
            cache,
            publisher,
            breaker,
            pipeline,
        }
    }
}

pub fn amount(value: &str) -> BigDecimal {
    value.parse().unwrap()
}

pub fn pending(kind: TransactionKind) -> Transaction {
    Transaction::new(kind, amount("100"), "application/json")
}

pub fn with_status(status: TransactionStatus) -> Transaction {
    let mut tx = pending(TransactionKind::Deposit);
    tx.status = status;
    tx
}
