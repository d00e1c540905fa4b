//! Network fetching: single-attempt HTTP GET, usage-policy checks, and the
//! retry/backoff loop.

pub mod client;
pub mod retry;
pub mod robots;

// Re-exports for convenient access
pub use client::{Fetcher, HttpFetcher, DISALLOWED_MESSAGE};
pub use retry::{is_rate_limit_error, BackoffDecision, BackoffPolicy, RetryingFetcher};
pub use robots::is_disallowed;
