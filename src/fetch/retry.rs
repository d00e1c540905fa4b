//! Retry/backoff policy and the retrying fetch loop.
//!
//! Only rate-limit failures are retried; everything else is terminal for the
//! attempt loop. The wait starts at twice the per-attempt timeout and doubles
//! on every consecutive rate-limit retry. The backoff sleep blocks only the
//! issuing worker task, never the scheduler.

use std::sync::Arc;
use std::time::Duration;

use crate::types::FetchOutcome;

use super::client::Fetcher;

/// Marker for HTTP 429 responses in failure descriptions
/// (see `HttpFetcher`'s `"HTTP error {status}"` format).
const RATE_LIMIT_MARKER: &str = "HTTP error 429";

/// Whether a failure description is a rate-limit signal.
pub fn is_rate_limit_error(error: &str) -> bool {
    error.contains(RATE_LIMIT_MARKER)
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Sleep this long, then try again
    RetryAfter(Duration),
    /// Stop; return the last failure
    GiveUp,
}

/// Exponential backoff for rate-limited fetches.
///
/// `decide(attempt_index, error)` for attempt indices `0..=retries`; the wait
/// before the attempt after index `n` is `base_timeout * 2^(n + 1)`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base_timeout: Duration,
    retries: u32,
}

impl BackoffPolicy {
    /// Build a policy seeded by the per-attempt network timeout.
    pub fn new(base_timeout: Duration, retries: u32) -> Self {
        Self {
            base_timeout,
            retries,
        }
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Decide whether the attempt at `attempt_index` (0-based) should be
    /// retried after failing with `error`.
    pub fn decide(&self, attempt_index: u32, error: &str) -> BackoffDecision {
        if attempt_index + 1 >= self.max_attempts() {
            return BackoffDecision::GiveUp;
        }
        if !is_rate_limit_error(error) {
            return BackoffDecision::GiveUp;
        }
        let factor = 2u32.saturating_pow(attempt_index + 1);
        BackoffDecision::RetryAfter(self.base_timeout.saturating_mul(factor))
    }
}

/// A fetcher wrapped with a backoff policy: at most `retries + 1` attempts,
/// first success wins, last error wins on exhaustion.
pub struct RetryingFetcher {
    inner: Arc<dyn Fetcher>,
    policy: BackoffPolicy,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, policy: BackoffPolicy) -> Self {
        Self { inner, policy }
    }

    /// Fetch `url`, applying the backoff policy between attempts.
    pub async fn fetch_with_retry(&self, url: &str) -> FetchOutcome {
        let mut last_failure = String::new();
        for attempt in 0..self.policy.max_attempts() {
            match self.inner.fetch(url).await {
                FetchOutcome::Success(bytes) => return FetchOutcome::Success(bytes),
                FetchOutcome::Failure(error) => {
                    match self.policy.decide(attempt, &error) {
                        BackoffDecision::RetryAfter(wait) => {
                            tracing::debug!(url, attempt, ?wait, "rate limited, backing off");
                            tokio::time::sleep(wait).await;
                        }
                        BackoffDecision::GiveUp => return FetchOutcome::Failure(error),
                    }
                    last_failure = error;
                }
            }
        }
        FetchOutcome::Failure(last_failure)
    }
}
