//! Storage, decoding, and output seams for the shard pipeline.
//!
//! The driver talks to backing storage, the shard decoder, the per-shard
//! sample writer, and the stats sink exclusively through these traits, so
//! tests and alternative backends can swap any of them out.

pub mod fs;
pub mod json;
pub mod writer;

use std::path::Path;

use async_trait::async_trait;

use crate::error::{ShardError, ShardResult};
use crate::stats::ShardStats;
use crate::types::{CellValue, ProcessedResult, Row};

// Re-exports for convenient access
pub use fs::FsStorage;
pub use json::{JsonLinesDecoder, JsonStatsSink};
pub use writer::{FilesWriter, FilesWriterFactory};

/// Backing storage holding shard inputs.
#[async_trait]
pub trait ShardStorage: Send + Sync {
    /// Read the full contents of the shard at `path`.
    async fn open(&self, path: &Path) -> ShardResult<Vec<u8>>;

    /// Remove the shard input. Called last, only after results and stats are
    /// durably written.
    async fn remove(&self, path: &Path) -> ShardResult<()>;
}

/// Decodes raw shard bytes into a column table.
pub trait ShardDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> ShardResult<ShardTable>;
}

/// Per-shard sample writer. One instance per shard; calls are serialized by
/// the driver, so implementations need no internal locking.
pub trait SampleWriter: Send {
    /// Persist one terminal result: payload (accepted samples only),
    /// metadata, and optionally the caption.
    fn write(&mut self, result: &ProcessedResult) -> ShardResult<()>;

    /// Flush and finalize. Must be called exactly once, before the shard's
    /// stats are emitted.
    fn close(&mut self) -> ShardResult<()>;
}

/// Creates one [`SampleWriter`] per shard.
pub trait SampleWriterFactory: Send + Sync {
    fn create(&self, shard_id: u64, schema: &[String]) -> ShardResult<Box<dyn SampleWriter>>;
}

/// Sink for per-shard aggregate statistics.
pub trait StatsSink: Send + Sync {
    fn write_stats(&self, stats: &ShardStats) -> ShardResult<()>;
}

/// A decoded shard: named columns of equal length.
#[derive(Debug, Clone)]
pub struct ShardTable {
    schema: Vec<String>,
    columns: Vec<Vec<CellValue>>,
    row_count: usize,
}

impl ShardTable {
    /// Build a table from a schema and its column data. Column count and
    /// lengths must agree.
    pub fn new(schema: Vec<String>, columns: Vec<Vec<CellValue>>) -> ShardResult<Self> {
        if schema.len() != columns.len() {
            return Err(ShardError::Decode(format!(
                "schema has {} columns but data has {}",
                schema.len(),
                columns.len()
            )));
        }
        let row_count = columns.first().map(Vec::len).unwrap_or(0);
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(ShardError::Decode("ragged columns".to_string()));
        }
        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    /// Column names in table order.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// A column's cells by name.
    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.schema
            .iter()
            .position(|c| c == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Materialize rows holding exactly `column_list`'s columns, in that
    /// order. Fails if any requested column is absent from the shard.
    pub fn select(&self, column_list: &[String]) -> ShardResult<Vec<Row>> {
        let selected: Vec<&[CellValue]> = column_list
            .iter()
            .map(|name| {
                self.column(name)
                    .ok_or_else(|| ShardError::MissingColumn(name.clone()))
            })
            .collect::<ShardResult<_>>()?;

        Ok((0..self.row_count)
            .map(|row| selected.iter().map(|col| col[row].clone()).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ShardTable {
        ShardTable::new(
            vec!["url".to_string(), "caption".to_string()],
            vec![
                vec![
                    CellValue::Text("http://a".to_string()),
                    CellValue::Text("http://b".to_string()),
                ],
                vec![CellValue::Text("one".to_string()), CellValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_reorders_columns() {
        let rows = table()
            .select(&["caption".to_string(), "url".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].as_text(), Some("one"));
        assert_eq!(rows[0][1].as_text(), Some("http://a"));
        assert_eq!(rows[1][0], CellValue::Null);
    }

    #[test]
    fn test_select_missing_column_fails() {
        let err = table().select(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, ShardError::MissingColumn(name) if name == "nope"));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = ShardTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![CellValue::Null], vec![]],
        )
        .unwrap_err();
        assert!(matches!(err, ShardError::Decode(_)));
    }

    #[test]
    fn test_empty_table_has_zero_rows() {
        let t = ShardTable::new(vec![], vec![]).unwrap();
        assert_eq!(t.row_count(), 0);
        assert!(t.select(&[]).unwrap().is_empty());
    }
}
