//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Network fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt network timeout in milliseconds
    pub timeout_ms: u64,

    /// Extra attempts after the first (0 = single attempt)
    pub retries: u32,

    /// Operator-supplied token appended to the User-Agent and matched
    /// against scoped X-Robots-Tag directives
    pub user_agent_token: Option<String>,

    /// X-Robots-Tag directives that disallow use of a fetched image
    /// (empty = headers are not inspected)
    pub disallowed_header_directives: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 0,
            user_agent_token: None,
            disallowed_header_directives: Vec::new(),
        }
    }
}

impl FetchConfig {
    /// Per-attempt timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// User-agent token normalized for directive matching: trimmed,
    /// lowercased, empty collapsed to `None`.
    pub fn normalized_user_agent_token(&self) -> Option<String> {
        self.user_agent_token
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }

    /// Disallowed directives normalized to a lowercase set.
    pub fn disallowed_directives(&self) -> HashSet<String> {
        self.disallowed_header_directives
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// Per-sample processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker parallelism; the in-flight sample gate holds `2 * worker_count`
    /// permits
    pub worker_count: usize,

    /// Decode EXIF tags from fetched bytes into the metadata
    pub extract_exif: bool,

    /// Algorithm name for the content hash added to accepted samples
    /// (`md5`, `sha1`, `sha256`, `sha512`, `blake3`); `None` disables it
    pub compute_hash: Option<String>,

    /// Algorithm name for verifying fetched bytes against a stored digest
    /// column of the same name; `None` disables verification
    pub verify_hash: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            worker_count: 16,
            extract_exif: false,
            compute_hash: None,
            verify_hash: None,
        }
    }
}

/// Shard layout and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    /// Columns to read from each shard, in order; must include `url`
    pub column_list: Vec<String>,

    /// Maximum rows per shard; sets the row-index digit width of synthetic keys
    pub samples_per_shard: u64,

    /// Digit width reserved for shard ids in synthetic keys and output names
    pub shard_id_digits: usize,

    /// Payload encoding format handed to the writer (file extension)
    pub encode_format: String,

    /// Persist captions alongside payloads
    pub save_caption: bool,

    /// Output location handed to writers and the stats sink
    pub output_dir: PathBuf,

    /// Column carrying bounding boxes for region blurring, if any
    pub bbox_column: Option<String>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            column_list: vec!["url".to_string(), "caption".to_string()],
            samples_per_shard: 10_000,
            shard_id_digits: 5,
            encode_format: "jpg".to_string(),
            save_caption: true,
            output_dir: PathBuf::from("output"),
            bbox_column: None,
        }
    }
}

impl ShardConfig {
    /// Digit width reserved for row indices in synthetic keys.
    pub fn sample_digits(&self) -> usize {
        crate::key::digit_width(self.samples_per_shard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_token_normalization() {
        let config = FetchConfig {
            user_agent_token: Some("  MyBot  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.normalized_user_agent_token().as_deref(), Some("mybot"));

        let empty = FetchConfig {
            user_agent_token: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(empty.normalized_user_agent_token(), None);
    }

    #[test]
    fn test_disallowed_directives_lowercased() {
        let config = FetchConfig {
            disallowed_header_directives: vec!["NoAI".to_string(), " noindex ".to_string()],
            ..Default::default()
        };
        let set = config.disallowed_directives();
        assert!(set.contains("noai"));
        assert!(set.contains("noindex"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_sample_digits_follows_shard_capacity() {
        let config = ShardConfig {
            samples_per_shard: 10_000,
            ..Default::default()
        };
        assert_eq!(config.sample_digits(), 4);
    }
}
