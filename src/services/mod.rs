pub mod dual_write;
pub mod idempotency_guard;
pub mod status_resolver;
pub mod transaction_pipeline;

pub use dual_write::{DualWriteCoordinator, Finalize};
pub use idempotency_guard::IdempotencyGuard;
pub use status_resolver::{CacheLookup, LookupError, StatusLookup, StatusResolver, StoreLookup};
pub use transaction_pipeline::TransactionPipeline;
