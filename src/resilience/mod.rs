//! Resilience primitives.
//!
//! # Data Flow
//! ```text
//! Publish to downstream:
//!     → circuit_breaker.rs (fail fast while the dependency is known bad)
//!     → retry.rs (bounded attempts with jittered backoff)
//!     → publisher
//! ```
//!
//! `retry` is also used on its own for connection bootstrap and single-row reads.

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{calculate_backoff, retry, RetryPolicy};
