//! Rejects status transitions for transactions that are already terminal.

use std::sync::Arc;

use crate::domain::TransactionStatus;
use crate::error::PipelineError;
use crate::services::status_resolver::{LookupError, StatusResolver};

#[derive(Clone)]
pub struct IdempotencyGuard {
    resolver: Arc<StatusResolver>,
}

impl IdempotencyGuard {
    pub fn new(resolver: Arc<StatusResolver>) -> Self {
        Self { resolver }
    }

    /// Fast pre-check for a callback. The read is not atomic with the write
    /// that follows; `DualWriteCoordinator::finalize_status` settles races.
    pub async fn validate_transition(
        &self,
        transaction_id: &str,
        new_status: TransactionStatus,
    ) -> Result<(), PipelineError> {
        let current = self
            .resolver
            .get_status(transaction_id)
            .await
            .map_err(|e| match e {
                LookupError::NotFound(id) => PipelineError::NotFound(id),
                LookupError::Unavailable(msg) => PipelineError::Store(msg),
            })?;

        if current.is_terminal() {
            tracing::info!(
                transaction_id,
                current = %current,
                requested = %new_status,
                "Rejecting transition of finalized transaction"
            );
            return Err(PipelineError::AlreadyFinalized {
                transaction_id: transaction_id.to_string(),
                status: current,
            });
        }

        Ok(())
    }
}
