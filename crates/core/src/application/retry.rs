// Retry/Backoff Scheduler policy
use crate::domain::{ErrorClass, RetryState};
use std::time::Duration;
use tracing::debug;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the backoff delay
    Retry(Duration),
    /// Do not retry, settle the request with its error
    Failed(FailReason),
}

/// Why a failed request will not be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// `retry_count` reached `max_retries`
    Exhausted,
    /// Error classified as non-transient
    NotRetryable,
}

/// Retry policy
///
/// Determines if a failed request should be retried based on:
/// - Retries already performed against the per-request ceiling
/// - The error's class (only transient classes are retried)
///
/// Delays double per attempt: `base * 2^(retry_count - 1)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `base_delay_ms` - Base delay in milliseconds (default: 1000)
    pub fn new(base_delay_ms: u64) -> Self {
        Self { base_delay_ms }
    }

    /// Decide whether a failed attempt is retried.
    ///
    /// Exhaustion is checked before classification, so an exhausted request
    /// fails even when its error is transient.
    ///
    /// # Example
    /// ```text
    /// match policy.should_retry(&state, err.classify()) {
    ///     RetryDecision::Retry(delay) => sleep(delay).await,
    ///     RetryDecision::Failed(reason) => reject(err),
    /// }
    /// ```
    pub fn should_retry(&self, state: &RetryState, class: ErrorClass) -> RetryDecision {
        if state.is_exhausted() {
            debug!(
                retry_count = state.retry_count,
                max_retries = state.max_retries,
                "Max retries reached"
            );
            return RetryDecision::Failed(FailReason::Exhausted);
        }
        if !class.is_retryable() {
            return RetryDecision::Failed(FailReason::NotRetryable);
        }
        RetryDecision::Retry(self.backoff_delay(state.retry_count + 1))
    }

    /// Prepare request state for its next attempt
    pub fn prepare_for_retry(&self, state: &mut RetryState) {
        state.retry_count += 1;
    }

    /// Delay before retry number `retry` (1-based), saturating on overflow
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}
