//! Core data types for the shard download pipeline.
//!
//! These types flow between the fetcher, the sample processor, the bounded
//! scheduler, and the shard driver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dynamically typed cell within a shard row.
///
/// Shards are columnar; each column holds one `CellValue` variant per row.
/// `Bboxes` carries `[x_min, y_min, x_max, y_max]` boxes in relative
/// coordinates, used by transforms that blur regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value
    Null,
    /// UTF-8 text (urls, captions, stored digests)
    Text(String),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Bounding boxes, one `[x0, y0, x1, y1]` per region
    Bboxes(Vec<[f32; 4]>),
}

impl CellValue {
    /// The cell as text, if it holds any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The cell as a bounding-box list, if it holds one.
    pub fn as_bboxes(&self) -> Option<&[[f32; 4]]> {
        match self {
            CellValue::Bboxes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to a JSON value for metadata assembly.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Int(i) => serde_json::json!(i),
            CellValue::Float(f) => serde_json::json!(f),
            CellValue::Bboxes(b) => serde_json::json!(b),
        }
    }
}

/// One input record: the row's cells in configured column order.
pub type Row = Vec<CellValue>;

/// Terminal outcome of fetching one url, after retries.
///
/// Exactly one variant is ever produced per row; transport, DNS, TLS, and
/// policy failures are all captured as the failure description.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Full response body
    Success(Vec<u8>),
    /// Human-readable error description from the last attempt
    Failure(String),
}

/// Closed status taxonomy for terminal per-row results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    FailedToDownload,
    FailedToResize,
}

impl Status {
    /// Stable string form used in metadata and stats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::FailedToDownload => "failed_to_download",
            Status::FailedToResize => "failed_to_resize",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result metadata for one row.
///
/// `columns` mirrors the configured column list with the verification-hash
/// column omitted (stored digests are never persisted as-is). `extra` holds
/// the optional synthetic fields — the EXIF string and the computed content
/// hash keyed by its algorithm name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Original row fields by column name
    pub columns: BTreeMap<String, serde_json::Value>,

    /// Synthetic key (fixed-width, sortable)
    pub key: String,

    /// Terminal status
    pub status: Status,

    /// Failure description; `None` on success
    pub error_message: Option<String>,

    /// Output width after transform
    pub width: Option<u32>,

    /// Output height after transform
    pub height: Option<u32>,

    /// Width before transform
    pub original_width: Option<u32>,

    /// Height before transform
    pub original_height: Option<u32>,

    /// Optional synthetic fields (exif, computed hash)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SampleMetadata {
    /// Flatten into a single JSON map in output-schema order: original
    /// columns, then the synthetic result fields, then the optional extras.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.columns {
            map.insert(name.clone(), value.clone());
        }
        map.insert("key".into(), serde_json::json!(self.key));
        map.insert("status".into(), serde_json::json!(self.status.as_str()));
        map.insert("error_message".into(), serde_json::json!(self.error_message));
        map.insert("width".into(), serde_json::json!(self.width));
        map.insert("height".into(), serde_json::json!(self.height));
        map.insert("original_width".into(), serde_json::json!(self.original_width));
        map.insert("original_height".into(), serde_json::json!(self.original_height));
        for (name, value) in &self.extra {
            map.insert(name.clone(), value.clone());
        }
        map
    }
}

/// Terminal record for one row: exactly one is produced per input row.
#[derive(Debug, Clone)]
pub enum ProcessedResult {
    /// The sample was fetched and transformed; the payload goes to the writer.
    Accepted {
        payload: Vec<u8>,
        caption: Option<String>,
        meta: SampleMetadata,
    },
    /// The sample failed; only metadata is persisted.
    Rejected {
        caption: Option<String>,
        meta: SampleMetadata,
    },
}

impl ProcessedResult {
    /// The result metadata, whichever variant.
    pub fn meta(&self) -> &SampleMetadata {
        match self {
            ProcessedResult::Accepted { meta, .. } | ProcessedResult::Rejected { meta, .. } => meta,
        }
    }

    /// The transformed payload, if the sample was accepted.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            ProcessedResult::Accepted { payload, .. } => Some(payload),
            ProcessedResult::Rejected { .. } => None,
        }
    }

    /// The caption, if the shard carries a caption column.
    pub fn caption(&self) -> Option<&str> {
        match self {
            ProcessedResult::Accepted { caption, .. } | ProcessedResult::Rejected { caption, .. } => {
                caption.as_deref()
            }
        }
    }
}

/// What the bounded scheduler yields per row, in completion order.
#[derive(Debug)]
pub struct CompletedSample {
    /// Row position within the shard
    pub row_index: usize,

    /// The terminal result record
    pub result: ProcessedResult,

    /// Terminal status, mirrored out of the metadata for counter updates
    pub status: Status,

    /// Failure description, `None` on success
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_are_stable() {
        assert_eq!(Status::Success.as_str(), "success");
        assert_eq!(Status::FailedToDownload.as_str(), "failed_to_download");
        assert_eq!(Status::FailedToResize.as_str(), "failed_to_resize");
    }

    #[test]
    fn test_metadata_flattens_in_schema_order() {
        let mut columns = BTreeMap::new();
        columns.insert("url".to_string(), serde_json::json!("http://example.com/a.jpg"));
        columns.insert("caption".to_string(), serde_json::json!("a cat"));
        let mut extra = BTreeMap::new();
        extra.insert("sha256".to_string(), serde_json::json!("abcd"));

        let meta = SampleMetadata {
            columns,
            key: "00005".to_string(),
            status: Status::Success,
            error_message: None,
            width: Some(256),
            height: Some(256),
            original_width: Some(512),
            original_height: Some(512),
            extra,
        };

        let map = meta.to_json_map();
        assert_eq!(map["key"], "00005");
        assert_eq!(map["status"], "success");
        assert_eq!(map["error_message"], serde_json::Value::Null);
        assert_eq!(map["width"], 256);
        assert_eq!(map["sha256"], "abcd");
        assert_eq!(map["caption"], "a cat");
    }

    #[test]
    fn test_rejected_result_has_no_payload() {
        let meta = SampleMetadata {
            columns: BTreeMap::new(),
            key: "0".to_string(),
            status: Status::FailedToDownload,
            error_message: Some("timeout".to_string()),
            width: None,
            height: None,
            original_width: None,
            original_height: None,
            extra: BTreeMap::new(),
        };
        let result = ProcessedResult::Rejected {
            caption: None,
            meta,
        };
        assert!(result.payload().is_none());
        assert_eq!(result.meta().error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_cell_value_accessors() {
        assert_eq!(CellValue::Text("x".into()).as_text(), Some("x"));
        assert_eq!(CellValue::Null.as_text(), None);
        let boxes = CellValue::Bboxes(vec![[0.0, 0.0, 0.5, 0.5]]);
        assert_eq!(boxes.as_bboxes().unwrap().len(), 1);
    }
}
