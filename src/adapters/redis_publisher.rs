//! Redis list publisher. The downstream gateway pops envelopes off the queue.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::ports::{PublishError, TransactionPublisher};

/// Message pushed for every accepted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishEnvelope {
    pub transaction_id: String,
    pub data_format: String,
    pub payload: String,
}

#[derive(Clone)]
pub struct RedisQueuePublisher {
    conn: MultiplexedConnection,
    queue: String,
}

impl RedisQueuePublisher {
    pub async fn connect(redis_url: &str, queue: impl Into<String>) -> Result<Self, redis::RedisError> {
        let conn = super::redis_status_cache::connect_with_retry(redis_url).await?;
        let queue = queue.into();
        tracing::info!("Publishing transactions to Redis queue '{}'", queue);
        Ok(Self { conn, queue })
    }
}

#[async_trait]
impl TransactionPublisher for RedisQueuePublisher {
    async fn publish(
        &self,
        transaction_id: &str,
        payload: &[u8],
        data_format: &str,
    ) -> Result<(), PublishError> {
        let envelope = PublishEnvelope {
            transaction_id: transaction_id.to_string(),
            data_format: data_format.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        };
        let message = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        let depth: i64 = conn.rpush(&self.queue, message).await?;
        tracing::debug!(transaction_id, depth, "Transaction published");
        Ok(())
    }
}
