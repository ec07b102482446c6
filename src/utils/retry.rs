//! Retry utilities for resilient operations
//!
//! A bounded retry loop with linear backoff plus random jitter: after the
//! n-th failed attempt the caller waits `n * step + jitter` before trying
//! again.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds
    pub step_ms: u64,

    /// Upper bound (exclusive) of the random jitter in milliseconds
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step_ms: 500,
            jitter_ms: 350,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom attempt budget and default delays
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a policy with custom delays
    pub fn with_delays(max_attempts: u32, step_ms: u64, jitter_ms: u64) -> Self {
        Self {
            max_attempts,
            step_ms,
            jitter_ms,
        }
    }

    /// Policy without any waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::with_delays(max_attempts, 0, 0)
    }

    /// Lower bound of the delay after the given failed attempt (1-based)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.step_ms.saturating_mul(u64::from(attempt)))
    }

    /// Delay after the given failed attempt (1-based), jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

/// Execute an operation with retry logic and linear backoff
///
/// Returns the first success, or the error of the final attempt.
///
/// # Example
///
/// ```no_run
/// use manchete::utils::retry::{with_retry, RetryPolicy};
///
/// # async fn run() -> Result<(), std::io::Error> {
/// let policy = RetryPolicy::default();
/// let value = with_retry(&policy, |_attempt| async { Ok::<_, std::io::Error>(42) }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Operation failed, giving up");
                return Err(e);
            }
        }
    }
}
