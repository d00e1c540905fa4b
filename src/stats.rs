//! Per-shard statistics: counters and the capped status histogram.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A counter over string keys with bounded cardinality.
///
/// Download error strings are open-ended (one per failure mode, host, or
/// status line), so the histogram caps the number of distinct keys it tracks.
/// When an increment would push the map past the cap, the least-frequent
/// entries are evicted down to the cap. Evicted counts are dropped, never
/// merged into a catch-all — the histogram is a diagnostic aid, not an exact
/// tally (the exact totals live in [`ShardStats`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CappedCounter {
    counts: BTreeMap<String, u64>,
    max_size: usize,
}

impl Default for CappedCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZE)
    }
}

impl CappedCounter {
    /// Default cardinality cap.
    pub const DEFAULT_MAX_SIZE: usize = 100;

    /// Create a counter holding at most `max_size` distinct keys.
    pub fn new(max_size: usize) -> Self {
        Self {
            counts: BTreeMap::new(),
            max_size: max_size.max(1),
        }
    }

    /// Increment `key` by one, evicting least-frequent entries if the map
    /// would exceed the cap.
    pub fn increment(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
            return;
        }
        if self.counts.len() >= self.max_size {
            self.evict_to_cap();
        }
        self.counts.insert(key.to_string(), 1);
    }

    /// The tracked count for `key`, zero if absent or evicted.
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys currently tracked.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no key has been observed (or all were evicted).
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Borrow the tracked distribution.
    pub fn distribution(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Drop least-frequent entries until one slot below the cap is free.
    fn evict_to_cap(&mut self) {
        while self.counts.len() >= self.max_size {
            let victim = self
                .counts
                .iter()
                .min_by_key(|(_, count)| **count)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    self.counts.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Aggregate statistics for one processed shard, emitted to the stats sink
/// after the writer has been closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardStats {
    /// Shard identifier
    pub shard_id: u64,

    /// Total rows in the shard
    pub count: u64,

    /// Rows with status `success`
    pub successes: u64,

    /// Rows with status `failed_to_download`
    pub failed_to_download: u64,

    /// Rows with status `failed_to_resize`
    pub failed_to_resize: u64,

    /// Unix timestamp (seconds) when shard processing started
    pub start_time: f64,

    /// Unix timestamp (seconds) when shard processing finished
    pub end_time: f64,

    /// Capped histogram of observed statuses / download error strings
    pub status_dict: CappedCounter,
}

impl ShardStats {
    /// Conservation check: every row reached exactly one terminal status.
    pub fn is_balanced(&self) -> bool {
        self.successes + self.failed_to_download + self.failed_to_resize == self.count
    }
}
