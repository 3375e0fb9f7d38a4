//! Exponential backoff around a single provider call.
//!
//! The retrier knows nothing about providers; it re-invokes an async closure
//! while the supplied predicate says the failure is worth another try.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use cinesketch_core::config::RetryConfig;
use cinesketch_core::ProviderError;

use crate::classify::is_transient;

/// Backoff schedule: `delay(n) = min(initial * multiplier^n, max)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_retries: cfg.max_retries,
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            backoff_multiplier: cfg.backoff_multiplier,
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based: the wait after the first failure is `delay_for(0)`).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Re-runs a failing operation according to a [`RetryPolicy`].
#[derive(Clone, Debug, Default)]
pub struct BackoffRetrier {
    policy: RetryPolicy,
}

impl BackoffRetrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying while `is_retryable` holds and attempts remain.
    ///
    /// Makes at most `max_retries + 1` calls. A non-retryable failure is returned
    /// after exactly one call.
    pub async fn execute<T, F, Fut, P>(&self, operation: F, is_retryable: P) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        P: Fn(&ProviderError) -> bool,
    {
        self.execute_counted(operation, is_retryable).await.0
    }

    /// [`Self::execute`] with the shared transient-error classifier.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.execute(operation, is_transient).await
    }

    /// Like [`Self::execute`], also reporting how many calls were made.
    pub async fn execute_counted<T, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> (Result<T, ProviderError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        P: Fn(&ProviderError) -> bool,
    {
        let max_attempts = self.policy.max_retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Succeeded after retry");
                    }
                    return (Ok(value), attempt);
                }
                Err(err) => {
                    let retryable = is_retryable(&err);
                    if !retryable || attempt >= max_attempts {
                        if retryable {
                            warn!(attempts = attempt, error = %err, "Giving up after retries");
                        }
                        return (Err(err), attempt);
                    }

                    let delay = self.policy.delay_for(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
