//! Imgshard - Bounded-concurrency shard downloader for image datasets.
//!
//! Imgshard takes shards of url/caption records, fetches every image behind
//! an in-flight gate, verifies and transforms each payload, and persists one
//! terminal result per row plus per-shard statistics.
//!
//! # Architecture
//!
//! ```text
//! Shard → Decode → Fetch (retry/backoff) → Verify/Transform → Write → Stats → Remove
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgshard::{Config, ShardDriver, ShardOutcome, ShardRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let driver = ShardDriver::with_defaults(Config::default());
//!     let request = ShardRequest {
//!         shard_id: 0,
//!         path: "./00000.jsonl".into(),
//!     };
//!     match driver.process_shard(request).await {
//!         ShardOutcome::Completed(stats) => println!("done: {}/{} ok", stats.successes, stats.count),
//!         ShardOutcome::Failed(request) => eprintln!("shard {} failed", request.shard_id),
//!     }
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod fetch;
pub mod io;
pub mod key;
pub mod pipeline;
pub mod shard;
pub mod stats;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ImgshardError, Result, ShardError, ShardResult};
pub use fetch::{BackoffPolicy, Fetcher, HttpFetcher, RetryingFetcher};
pub use key::compute_key;
pub use pipeline::{BoundedScheduler, HashAlgorithm, MediaTransform, SampleProcessor};
pub use shard::{ShardDriver, ShardOutcome, ShardRequest};
pub use stats::{CappedCounter, ShardStats};
pub use types::{CellValue, CompletedSample, FetchOutcome, ProcessedResult, Row, SampleMetadata, Status};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
