//! Submit and callback orchestration.
//!
//! ```text
//! submit:   validate → coordinator.write_transaction → breaker(retry(publish))
//!                                                    └─ on error: update_status(failed), best effort
//! callback: validate → guard.validate_transition → coordinator.finalize_status
//! ```

use bigdecimal::BigDecimal;
use std::sync::Arc;

use crate::domain::{Transaction, TransactionKind, TransactionStatus};
use crate::error::PipelineError;
use crate::ports::{PublishError, TransactionPublisher};
use crate::resilience::{retry, BreakerError, CircuitBreaker, RetryPolicy};
use crate::security;
use crate::services::dual_write::{DualWriteCoordinator, Finalize};
use crate::services::idempotency_guard::IdempotencyGuard;
use crate::services::status_resolver::{LookupError, StatusResolver};
use crate::validation;

#[derive(Clone)]
pub struct TransactionPipeline {
    coordinator: DualWriteCoordinator,
    resolver: Arc<StatusResolver>,
    guard: IdempotencyGuard,
    publisher: Arc<dyn TransactionPublisher>,
    breaker: Arc<CircuitBreaker>,
    publish_policy: RetryPolicy,
}

impl TransactionPipeline {
    pub fn new(
        coordinator: DualWriteCoordinator,
        resolver: Arc<StatusResolver>,
        publisher: Arc<dyn TransactionPublisher>,
        breaker: Arc<CircuitBreaker>,
        publish_policy: RetryPolicy,
    ) -> Self {
        let guard = IdempotencyGuard::new(resolver.clone());
        Self {
            coordinator,
            resolver,
            guard,
            publisher,
            breaker,
            publish_policy,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Creates a pending transaction, persists it and forwards it downstream.
    ///
    /// When publishing fails the transaction is marked `failed` and the
    /// publish error is returned, even if that downgrade itself fails.
    pub async fn submit(
        &self,
        kind: TransactionKind,
        amount: BigDecimal,
        data_format: &str,
    ) -> Result<Transaction, PipelineError> {
        validation::validate_amount(&amount)?;

        let tx = Transaction::new(kind, amount, data_format);
        self.coordinator.write_transaction(&tx).await?;
        tracing::info!(
            transaction_id = %tx.transaction_id,
            kind = %tx.kind,
            "Transaction saved as pending"
        );

        if let Err(e) = self.publish(&tx).await {
            tracing::error!(transaction_id = %tx.transaction_id, "Failed to publish transaction: {}", e);

            if let Err(mark_err) = self
                .coordinator
                .update_status(&tx.transaction_id, TransactionStatus::Failed)
                .await
            {
                tracing::error!(
                    transaction_id = %tx.transaction_id,
                    "Failed to mark unpublished transaction as failed: {}",
                    mark_err
                );
            }
            return Err(e);
        }

        Ok(tx)
    }

    /// Applies a gateway callback moving a pending transaction to a terminal status.
    pub async fn apply_callback(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<(), PipelineError> {
        validation::validate_callback(transaction_id, status)?;

        self.guard.validate_transition(transaction_id, status).await?;

        match self.coordinator.finalize_status(transaction_id, status).await? {
            Finalize::Applied => {
                tracing::info!(transaction_id, status = %status, "Callback applied");
                Ok(())
            }
            // Lost a race with another callback after passing the guard.
            Finalize::AlreadyFinal(current) => Err(PipelineError::AlreadyFinalized {
                transaction_id: transaction_id.to_string(),
                status: current,
            }),
        }
    }

    pub async fn get_status(&self, transaction_id: &str) -> Result<TransactionStatus, PipelineError> {
        self.resolver
            .get_status(transaction_id)
            .await
            .map_err(|e| match e {
                LookupError::NotFound(id) => PipelineError::NotFound(id),
                LookupError::Unavailable(msg) => PipelineError::Store(msg),
            })
    }

    async fn publish(&self, tx: &Transaction) -> Result<(), PipelineError> {
        let payload = security::mask_payload(&serde_json::to_vec(tx).map_err(PublishError::from)?);
        let publisher = &self.publisher;
        let policy = &self.publish_policy;

        self.breaker
            .call(|| {
                retry(policy, || {
                    publisher.publish(&tx.transaction_id, payload.as_bytes(), &tx.data_format)
                })
            })
            .await
            .map_err(|e| match e {
                BreakerError::Rejected => PipelineError::CircuitOpen,
                BreakerError::Inner(e) => PipelineError::Publish(e.to_string()),
            })
    }
}
