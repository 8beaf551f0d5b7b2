//! Retry with exponential backoff for scoring requests.
//!
//! Each batch runs its attempts through [`RetryPolicy::run`]: attempt `n`
//! failing waits `base_delay * 2^n` (capped at `max_delay`) before the next
//! try. The policy returns the last error once attempts are spent; turning
//! that into a sentinel-scored batch is the executor's business, not ours.
//!
//! # Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use memrank::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//! let scores = policy.run(|| async { send_scoring_request().await }).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Ceiling for the doubling backoff delay.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential-backoff retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on the per-attempt delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delay ceiling.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Run an async operation with automatic retry.
    ///
    /// # Returns
    ///
    /// The operation's result, or the last error once all attempts are
    /// spent. Non-retryable errors short-circuit without further attempts.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.base_delay;
        let mut attempts = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        info!("Operation succeeded after {} attempts", attempts);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if attempts >= self.max_attempts {
                        warn!(
                            "Operation failed after {} attempts, giving up: {}",
                            attempts, e
                        );
                        return Err(e);
                    }

                    if !e.is_retryable() {
                        debug!("Error is non-retryable, stopping: {}", e);
                        return Err(e);
                    }

                    warn!(
                        "Attempt {}/{} failed, retrying in {:?}: {}",
                        attempts, self.max_attempts, delay, e
                    );

                    sleep(delay).await;
                    delay = (delay * 2).min(self.max_delay);
                }
            }
        }
    }
}
