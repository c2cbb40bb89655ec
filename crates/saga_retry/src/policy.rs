//! Retry policy and the backoff loop.

use saga_error::SagaResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// How often and how patiently to retry a failed call.
///
/// # Examples
///
/// ```
/// use saga_retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default().with_max_attempts(5usize);
/// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(200));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    max_attempts: usize,
    /// Delay before the second attempt, in milliseconds
    base_delay_ms: u64,
    /// Growth factor between delays
    multiplier: f64,
    /// Delay ceiling, in milliseconds
    max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(1usize)
    }

    /// Delay after failed attempt `attempt` (1-based), capped at the maximum.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let millis = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.min(self.max_delay_ms as f64) as u64)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are exhausted. The last error is returned.
#[instrument(skip(operation), fields(max_attempts = policy.max_attempts))]
pub async fn retry_with_backoff<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> SagaResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = SagaResult<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(attempt, "Executing operation");

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) => {
                if attempt >= policy.max_attempts.max(1) {
                    warn!(attempt, error = %err, "All retry attempts exhausted");
                    return Err(err);
                }

                if !err.is_retryable() {
                    warn!(error = %err, "Error is not retryable, failing immediately");
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                debug!(delay_ms = delay.as_millis() as u64, error = %err, "Retrying after failure");
                sleep(delay).await;
            }
        }
    }
}
