//! Redis implementation of StatusCache.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::TransactionStatus;
use crate::ports::{CacheError, CacheResult, StatusCache};
use crate::resilience::{retry, RetryPolicy};

const STATUS_PREFIX: &str = "txn_status:";

/// Status projection stored as plain Redis strings with no expiry.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn: MultiplexedConnection,
}

impl RedisStatusCache {
    /// Opens a multiplexed connection and verifies it with `PING`, retrying
    /// with the bootstrap policy.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let conn = connect_with_retry(redis_url).await?;
        tracing::info!("Connected to Redis status cache");
        Ok(Self { conn })
    }

    fn key(transaction_id: &str) -> String {
        format!("{}{}", STATUS_PREFIX, transaction_id)
    }
}

pub(crate) async fn connect_with_retry(
    redis_url: &str,
) -> Result<MultiplexedConnection, redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    retry(&RetryPolicy::bootstrap(), || {
        let client = client.clone();
        async move {
            let mut conn = client.get_multiplexed_async_connection().await?;
            redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await?;
            Ok::<_, redis::RedisError>(conn)
        }
    })
    .await
}

#[async_trait]
impl StatusCache for RedisStatusCache {
    async fn set_status(&self, transaction_id: &str, status: TransactionStatus) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::key(transaction_id), status.as_str()).await?;
        Ok(())
    }

    async fn get_status(&self, transaction_id: &str) -> CacheResult<TransactionStatus> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::key(transaction_id)).await?;

        match value {
            Some(raw) => raw
                .parse()
                .map_err(|e| CacheError::InvalidValue(format!("{}: {}", transaction_id, e))),
            None => Err(CacheError::Miss(transaction_id.to_string())),
        }
    }
}
