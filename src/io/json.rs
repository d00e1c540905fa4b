//! JSON Lines shard decoding and the JSON stats sink.

use std::path::PathBuf;

use crate::error::{ShardError, ShardResult};
use crate::key::shard_name;
use crate::stats::ShardStats;
use crate::types::CellValue;

use super::{ShardDecoder, ShardTable, StatsSink};

/// Decoder for shards stored as JSON Lines: one JSON object per line. The
/// first object fixes the schema; later objects may omit fields (decoded as
/// null) but introduce none.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesDecoder;

impl JsonLinesDecoder {
    pub fn new() -> Self {
        Self
    }

    fn cell_from_json(value: &serde_json::Value) -> ShardResult<CellValue> {
        match value {
            serde_json::Value::Null => Ok(CellValue::Null),
            serde_json::Value::String(s) => Ok(CellValue::Text(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(CellValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(CellValue::Float(f))
                } else {
                    Err(ShardError::Decode(format!("unrepresentable number {n}")))
                }
            }
            serde_json::Value::Array(_) => {
                let boxes: Vec<[f32; 4]> = serde_json::from_value(value.clone())
                    .map_err(|e| ShardError::Decode(format!("bad bbox list: {e}")))?;
                Ok(CellValue::Bboxes(boxes))
            }
            other => Err(ShardError::Decode(format!("unsupported cell: {other}"))),
        }
    }
}

impl ShardDecoder for JsonLinesDecoder {
    fn decode(&self, bytes: &[u8]) -> ShardResult<ShardTable> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ShardError::Decode(format!("shard is not UTF-8: {e}")))?;

        let mut schema: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<CellValue>> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let object: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(line).map_err(|e| {
                    ShardError::Decode(format!("line {}: {e}", line_no + 1))
                })?;

            if schema.is_empty() {
                schema = object.keys().cloned().collect();
                columns = vec![Vec::new(); schema.len()];
            }
            for (i, name) in schema.iter().enumerate() {
                let cell = match object.get(name) {
                    Some(value) => Self::cell_from_json(value)
                        .map_err(|e| ShardError::Decode(format!("line {}: {e}", line_no + 1)))?,
                    None => CellValue::Null,
                };
                columns[i].push(cell);
            }
        }

        ShardTable::new(schema, columns)
    }
}

/// Stats sink writing one pretty-printed JSON file per shard, named
/// `{padded_shard_id}_stats.json`, next to the shard's output directory.
#[derive(Debug, Clone)]
pub struct JsonStatsSink {
    output_dir: PathBuf,
    shard_digits: usize,
}

impl JsonStatsSink {
    pub fn new(output_dir: PathBuf, shard_digits: usize) -> Self {
        Self {
            output_dir,
            shard_digits,
        }
    }

    fn stats_path(&self, shard_id: u64) -> PathBuf {
        self.output_dir
            .join(format!("{}_stats.json", shard_name(shard_id, self.shard_digits)))
    }
}

impl StatsSink for JsonStatsSink {
    fn write_stats(&self, stats: &ShardStats) -> ShardResult<()> {
        let json = serde_json::to_string_pretty(stats)
            .map_err(|e| ShardError::Stats(e.to_string()))?;
        std::fs::write(self.stats_path(stats.shard_id), json)
            .map_err(|e| ShardError::Stats(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CappedCounter;

    #[test]
    fn test_decode_fixes_schema_from_first_line() {
        let decoder = JsonLinesDecoder::new();
        let shard = concat!(
            "{\"url\": \"http://a\", \"caption\": \"one\"}\n",
            "{\"url\": \"http://b\"}\n",
            "\n",
            "{\"url\": \"http://c\", \"caption\": null}\n",
        );
        let table = decoder.decode(shard.as_bytes()).unwrap();

        assert_eq!(table.row_count(), 3);
        let captions = table.column("caption").unwrap();
        assert_eq!(captions[0].as_text(), Some("one"));
        assert_eq!(captions[1], CellValue::Null);
        assert_eq!(captions[2], CellValue::Null);
    }

    #[test]
    fn test_decode_numbers_and_bboxes() {
        let decoder = JsonLinesDecoder::new();
        let shard = "{\"bboxes\": [[0.0, 0.0, 0.5, 0.5]], \"rank\": 3, \"score\": 0.25}\n";
        let table = decoder.decode(shard.as_bytes()).unwrap();

        assert_eq!(
            table.column("bboxes").unwrap()[0].as_bboxes().unwrap(),
            &[[0.0, 0.0, 0.5, 0.5]]
        );
        assert_eq!(table.column("rank").unwrap()[0], CellValue::Int(3));
        assert_eq!(table.column("score").unwrap()[0], CellValue::Float(0.25));
    }

    #[test]
    fn test_decode_reports_bad_line_number() {
        let decoder = JsonLinesDecoder::new();
        let shard = "{\"url\": \"http://a\"}\nnot json\n";
        let err = decoder.decode(shard.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_empty_shard_decodes_to_empty_table() {
        let table = JsonLinesDecoder::new().decode(b"").unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_stats_file_name_is_padded() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonStatsSink::new(dir.path().to_path_buf(), 5);
        let stats = ShardStats {
            shard_id: 7,
            count: 1,
            successes: 1,
            failed_to_download: 0,
            failed_to_resize: 0,
            start_time: 1.0,
            end_time: 2.0,
            status_dict: CappedCounter::default(),
        };
        sink.write_stats(&stats).unwrap();

        let written = dir.path().join("00007_stats.json");
        let parsed: ShardStats =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(parsed.shard_id, 7);
        assert!(parsed.is_balanced());
    }
}
