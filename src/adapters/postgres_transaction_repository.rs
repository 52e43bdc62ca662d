//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Transaction, TransactionStatus};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};
use crate::resilience::{retry, RetryPolicy};

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
    read_policy: RetryPolicy,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            read_policy: RetryPolicy::single_read(),
        }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (transaction_id, amount, kind, status, created_at, data_format)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&tx.transaction_id)
        .bind(&tx.amount)
        .bind(tx.kind.as_str())
        .bind(tx.status.as_str())
        .bind(tx.created_at)
        .bind(&tx.data_format)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        let pool = &self.pool;
        let row = retry(&self.read_policy, || {
            sqlx::query_as::<_, TransactionRow>(
                r#"
                SELECT transaction_id, amount, kind, status, created_at, data_format
                FROM transactions
                WHERE transaction_id = $1
                "#,
            )
            .bind(transaction_id)
            .fetch_optional(pool)
        })
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(transaction_id.to_string()))?
            .into_domain()
    }

    async fn update_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE transactions SET status = $1 WHERE transaction_id = $2")
            .bind(status.as_str())
            .bind(transaction_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(transaction_id.to_string()));
        }
        Ok(())
    }

    async fn finalize_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE transactions SET status = $1 WHERE transaction_id = $2 AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing changed: either the row is gone or it is already terminal.
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM transactions WHERE transaction_id = $1")
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await?;

        match exists {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound(transaction_id.to_string())),
        }
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    transaction_id: String,
    amount: bigdecimal::BigDecimal,
    kind: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    data_format: String,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let kind = self
            .kind
            .parse()
            .map_err(|e| RepositoryError::InvalidRow(format!("{}: {}", self.transaction_id, e)))?;
        let status = self
            .status
            .parse()
            .map_err(|e| RepositoryError::InvalidRow(format!("{}: {}", self.transaction_id, e)))?;

        Ok(Transaction {
            transaction_id: self.transaction_id,
            amount: self.amount,
            kind,
            status,
            created_at: self.created_at,
            data_format: self.data_format,
        })
    }
}
