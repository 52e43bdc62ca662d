pub mod postgres_transaction_repository;
pub mod redis_publisher;
pub mod redis_status_cache;

pub use postgres_transaction_repository::PostgresTransactionRepository;
pub use redis_publisher::{PublishEnvelope, RedisQueuePublisher};
pub use redis_status_cache::RedisStatusCache;
