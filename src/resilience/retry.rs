//! Bounded retry with exponential backoff and jitter.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many times to run an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Attempt counts below 1 are clamped to 1.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Retries back to back with no delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Policy used for connection bootstrap (connect + ping).
    pub fn bootstrap() -> Self {
        Self::new(5, Duration::from_millis(200), Duration::from_secs(5))
    }

    /// Policy used for single-row reads.
    pub fn single_read() -> Self {
        Self::new(3, Duration::from_millis(20), Duration::from_millis(200))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay)
    }
}

/// Exponential delay capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 || base.is_zero() {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range = capped.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(jitter)
}

/// Runs `operation` until it succeeds or `policy.max_attempts()` invocations
/// have failed, in which case the error of the final invocation is returned.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_attempts => {
                tracing::warn!("Giving up after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                let backoff = policy.delay_after(attempt);
                tracing::debug!(
                    "Attempt {} of {} failed: {}. Retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    e,
                    backoff
                );
                if !backoff.is_zero() {
                    sleep(backoff).await;
                }
            }
        }
    }
}
