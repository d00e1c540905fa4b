//! Per-sample processing: verification, transform delegation, metadata
//! assembly.
//!
//! Every call produces exactly one terminal [`CompletedSample`] — failures of
//! any kind become `Rejected` results with a status and a message, never
//! errors crossing this boundary.

use std::sync::Arc;

use crate::error::ShardError;
use crate::key::compute_key;
use crate::types::{
    CellValue, CompletedSample, FetchOutcome, ProcessedResult, Row, SampleMetadata, Status,
};

use super::exif::extract_exif;
use super::hash::HashAlgorithm;
use super::transform::MediaTransform;

/// Column positions resolved once per shard by name lookup.
///
/// Absence of an optional column yields `None`, not an error; only `url` is
/// required.
#[derive(Debug, Clone)]
pub struct ColumnIndices {
    pub url: usize,
    pub caption: Option<usize>,
    pub crop: Option<usize>,
    pub bbox: Option<usize>,
    pub verify_hash: Option<usize>,
}

impl ColumnIndices {
    /// Resolve positions against the configured column list. The
    /// verification-hash column, when enabled, is the column named after the
    /// verification algorithm.
    pub fn resolve(
        column_list: &[String],
        bbox_column: Option<&str>,
        verify_hash: Option<HashAlgorithm>,
    ) -> Result<Self, ShardError> {
        let position = |name: &str| column_list.iter().position(|c| c == name);
        Ok(Self {
            url: position("url").ok_or_else(|| ShardError::MissingColumn("url".to_string()))?,
            caption: position("caption"),
            crop: position("crop"),
            bbox: bbox_column.and_then(position),
            verify_hash: verify_hash.and_then(|algo| position(algo.as_str())),
        })
    }
}

/// Assembles the terminal result record for one fetched row.
pub struct SampleProcessor {
    column_list: Vec<String>,
    indices: ColumnIndices,
    verify_hash: Option<HashAlgorithm>,
    compute_hash: Option<HashAlgorithm>,
    extract_exif: bool,
    shard_id: u64,
    sample_digits: usize,
    shard_digits: usize,
    transform: Arc<dyn MediaTransform>,
}

impl SampleProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        column_list: Vec<String>,
        indices: ColumnIndices,
        verify_hash: Option<HashAlgorithm>,
        compute_hash: Option<HashAlgorithm>,
        extract_exif: bool,
        shard_id: u64,
        sample_digits: usize,
        shard_digits: usize,
        transform: Arc<dyn MediaTransform>,
    ) -> Self {
        Self {
            column_list,
            indices,
            verify_hash,
            compute_hash,
            extract_exif,
            shard_id,
            sample_digits,
            shard_digits,
            transform,
        }
    }

    /// Produce the terminal result for `row` given its fetch outcome.
    pub fn process(&self, row_index: usize, row: &Row, outcome: FetchOutcome) -> CompletedSample {
        let key = compute_key(
            self.shard_id,
            row_index as u64,
            self.sample_digits,
            self.shard_digits,
        );
        let caption = self.cell_text(row, self.indices.caption);
        let mut meta = self.base_metadata(row, key);

        let bytes = match outcome {
            FetchOutcome::Success(bytes) => bytes,
            FetchOutcome::Failure(error) => {
                return Self::reject(row_index, meta, caption, Status::FailedToDownload, error);
            }
        };

        // Hash verification: mismatching payloads never reach the transform.
        if let (Some(algo), Some(idx)) = (self.verify_hash, self.indices.verify_hash) {
            let digest = algo.digest(&bytes);
            let stored = row.get(idx).and_then(CellValue::as_text);
            if stored != Some(digest.as_str()) {
                tracing::debug!(key = %meta.key, "stored digest does not match fetched bytes");
                return Self::reject(
                    row_index,
                    meta,
                    caption,
                    Status::FailedToDownload,
                    "hash mismatch".to_string(),
                );
            }
        }

        let bboxes = self
            .indices
            .bbox
            .and_then(|i| row.get(i))
            .and_then(CellValue::as_bboxes);
        let crop = self
            .indices
            .crop
            .and_then(|i| row.get(i))
            .and_then(CellValue::as_bboxes)
            .and_then(|b| b.first().copied());

        let transformed = match self.transform.transform(&bytes, bboxes, crop) {
            Ok(transformed) => transformed,
            Err(error) => {
                return Self::reject(row_index, meta, caption, Status::FailedToResize, error);
            }
        };

        if self.extract_exif {
            let exif = extract_exif(&bytes)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null);
            meta.extra.insert("exif".to_string(), exif);
        }
        if let Some(algo) = self.compute_hash {
            meta.extra
                .insert(algo.as_str().to_string(), serde_json::json!(algo.digest(&bytes)));
        }

        meta.status = Status::Success;
        meta.width = Some(transformed.width);
        meta.height = Some(transformed.height);
        meta.original_width = Some(transformed.original_width);
        meta.original_height = Some(transformed.original_height);

        CompletedSample {
            row_index,
            result: ProcessedResult::Accepted {
                payload: transformed.payload,
                caption,
                meta,
            },
            status: Status::Success,
            error_message: None,
        }
    }

    /// Reject a row whose worker failed outside the normal step policy
    /// (a panic in the transform, for instance). The failure is logged and
    /// becomes a terminal `failed_to_resize` result like any other
    /// processing error, so the row is never dropped.
    pub fn reject_unexpected(
        &self,
        row_index: usize,
        row: &Row,
        error: String,
    ) -> CompletedSample {
        let key = compute_key(
            self.shard_id,
            row_index as u64,
            self.sample_digits,
            self.shard_digits,
        );
        tracing::error!(key = %key, error = %error, "sample worker failed unexpectedly");
        let caption = self.cell_text(row, self.indices.caption);
        let meta = self.base_metadata(row, key);
        Self::reject(row_index, meta, caption, Status::FailedToResize, error)
    }

    /// Metadata skeleton: original row fields (verification-hash column
    /// omitted), synthetic key, all numeric fields null, and the optional
    /// exif/content-hash fields seeded to null when enabled so every row
    /// carries the same field set.
    fn base_metadata(&self, row: &Row, key: String) -> SampleMetadata {
        let columns = self
            .column_list
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.indices.verify_hash)
            .map(|(i, name)| {
                let value = row.get(i).map(CellValue::to_json).unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        let mut extra = std::collections::BTreeMap::new();
        if self.extract_exif {
            extra.insert("exif".to_string(), serde_json::Value::Null);
        }
        if let Some(algo) = self.compute_hash {
            extra.insert(algo.as_str().to_string(), serde_json::Value::Null);
        }
        SampleMetadata {
            columns,
            key,
            status: Status::FailedToDownload,
            error_message: None,
            width: None,
            height: None,
            original_width: None,
            original_height: None,
            extra,
        }
    }

    fn cell_text(&self, row: &Row, index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| row.get(i))
            .and_then(CellValue::as_text)
            .map(String::from)
    }

    fn reject(
        row_index: usize,
        mut meta: SampleMetadata,
        caption: Option<String>,
        status: Status,
        error: String,
    ) -> CompletedSample {
        meta.status = status;
        meta.error_message = Some(error.clone());
        CompletedSample {
            row_index,
            result: ProcessedResult::Rejected { caption, meta },
            status,
            error_message: Some(error),
        }
    }
}
