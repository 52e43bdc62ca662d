//! Circuit breaker guarding the publish dependency.
//!
//! # State Transitions
//! ```text
//! Closed → Open:      consecutive failures reach the threshold
//! Open → Half-Open:   first call after the cool-down has elapsed
//! Half-Open → Closed: the single trial call succeeds
//! Half-Open → Open:   the trial call fails (cool-down restarts)
//! ```
//!
//! One breaker instance is shared by every caller through an `Arc`. All
//! check-and-set steps run under the same mutex, which is never held across
//! an `.await`.
//!
//! Every transition bumps a generation counter and each admitted call
//! remembers the generation it started in. An outcome from an older
//! generation is ignored, so a slow call admitted while closed cannot close
//! an open circuit or re-open a half-open one.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

/// Either the breaker refused the call or the call itself failed.
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    #[error("circuit breaker open")]
    Rejected,
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    changed_at: Instant,
    generation: u64,
}

impl BreakerState {
    fn transition(&mut self, to: CircuitState) {
        self.state = to;
        self.changed_at = Instant::now();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config: CircuitBreakerConfig {
                failure_threshold: config.failure_threshold.max(1),
                cool_down: config.cool_down,
            },
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                changed_at: Instant::now(),
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Runs `operation` if the breaker permits it, recording the outcome.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.acquire() else {
            return Err(BreakerError::Rejected);
        };

        match operation().await {
            Ok(value) => {
                permit.succeed();
                Ok(value)
            }
            Err(e) => {
                permit.fail();
                Err(BreakerError::Inner(e))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                if inner.changed_at.elapsed() < self.config.cool_down {
                    return None;
                }
                inner.transition(CircuitState::HalfOpen);
                tracing::info!(breaker = %self.name, "Circuit half-open, allowing trial call");
            }
            // The trial call is already in flight.
            CircuitState::HalfOpen => return None,
        }

        Some(Permit {
            breaker: self,
            generation: inner.generation,
            settled: false,
        })
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(breaker = %self.name, "Ignoring outcome of a call from an earlier state");
            return;
        }

        inner.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.transition(CircuitState::Closed);
            tracing::info!(breaker = %self.name, "Circuit closed");
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(breaker = %self.name, "Ignoring outcome of a call from an earlier state");
            return;
        }

        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        match inner.state {
            CircuitState::HalfOpen => {
                inner.transition(CircuitState::Open);
                tracing::warn!(breaker = %self.name, "Trial call failed, circuit re-opened");
            }
            CircuitState::Closed if inner.consecutive_failures >= self.config.failure_threshold => {
                inner.transition(CircuitState::Open);
                tracing::warn!(
                    breaker = %self.name,
                    failures = inner.consecutive_failures,
                    "Circuit opened"
                );
            }
            _ => {}
        }
    }
}

/// Admission to run one call. A permit dropped without an outcome (the
/// caller's future was cancelled) counts as a failure so a half-open trial
/// can never wedge the breaker.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Permit<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_failure(self.generation);
        }
    }
}
