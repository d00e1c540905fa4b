//! Synthetic sample keys: globally unique, fixed-width, lexicographically
//! sortable identifiers derived from the shard id and the row index.
//!
//! The key is `shard_id * 10^P + row_index`, zero-padded to `P + S` digits,
//! where `P` is the digit width of the maximum rows per shard and `S` the
//! digit width of the maximum shard count. The encoding is independent of how
//! many rows a given shard actually holds, so keys from different shards (or
//! different indices) never collide.

/// Number of decimal digits needed to index `max` items (`0..max`).
///
/// This is `ceil(log10(max))`, with a floor of 1 so that a single-item
/// range still gets one digit.
pub fn digit_width(max: u64) -> usize {
    let mut width = 0usize;
    let mut bound = 1u64;
    while bound < max {
        bound = bound.saturating_mul(10);
        width += 1;
    }
    width.max(1)
}

/// Encode the synthetic key for `row_index` within `shard_id`.
///
/// `sample_digits` is the digit width reserved for the row index (`P`) and
/// `shard_digits` the width reserved for the shard id (`S`). The result is a
/// zero-padded string of exactly `P + S` characters.
pub fn compute_key(shard_id: u64, row_index: u64, sample_digits: usize, shard_digits: usize) -> String {
    let true_key = shard_id as u128 * 10u128.pow(sample_digits as u32) + row_index as u128;
    format!("{true_key:0width$}", width = sample_digits + shard_digits)
}

/// Zero-pad a shard id to `shard_digits` characters (used for per-shard
/// output names such as stats files).
pub fn shard_name(shard_id: u64, shard_digits: usize) -> String {
    format!("{shard_id:0shard_digits$}")
}
