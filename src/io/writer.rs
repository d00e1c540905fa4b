//! One-file-per-sample output writer.
//!
//! Each shard gets its own subdirectory named after the padded shard id.
//! Accepted samples produce `{key}.{encode_format}` plus `{key}.json`;
//! rejected samples produce only the metadata file. When caption saving is
//! enabled a `{key}.txt` is written for every sample, empty if the shard has
//! no caption for it.

use std::fs;
use std::path::PathBuf;

use crate::config::ShardConfig;
use crate::error::{ShardError, ShardResult};
use crate::key::shard_name;
use crate::types::ProcessedResult;

use super::{SampleWriter, SampleWriterFactory};

/// Writes each sample as individual files under the shard directory.
pub struct FilesWriter {
    dir: PathBuf,
    encode_format: String,
    save_caption: bool,
    closed: bool,
}

impl FilesWriter {
    fn io_error(e: std::io::Error) -> ShardError {
        ShardError::Writer(e.to_string())
    }
}

impl SampleWriter for FilesWriter {
    fn write(&mut self, result: &ProcessedResult) -> ShardResult<()> {
        if self.closed {
            return Err(ShardError::Writer("writer already closed".to_string()));
        }
        let meta = result.meta();
        let key = &meta.key;

        if let Some(payload) = result.payload() {
            let path = self.dir.join(format!("{key}.{}", self.encode_format));
            fs::write(path, payload).map_err(Self::io_error)?;
        }

        if self.save_caption {
            let caption = result.caption().unwrap_or("");
            fs::write(self.dir.join(format!("{key}.txt")), caption).map_err(Self::io_error)?;
        }

        let json = serde_json::to_string(&serde_json::Value::Object(meta.to_json_map()))
            .map_err(|e| ShardError::Writer(e.to_string()))?;
        fs::write(self.dir.join(format!("{key}.json")), json).map_err(Self::io_error)
    }

    fn close(&mut self) -> ShardResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Creates a [`FilesWriter`] per shard, making its output directory on the
/// way.
#[derive(Debug, Clone)]
pub struct FilesWriterFactory {
    config: ShardConfig,
}

impl FilesWriterFactory {
    pub fn new(config: ShardConfig) -> Self {
        Self { config }
    }
}

impl SampleWriterFactory for FilesWriterFactory {
    fn create(&self, shard_id: u64, _schema: &[String]) -> ShardResult<Box<dyn SampleWriter>> {
        let dir = self
            .config
            .output_dir
            .join(shard_name(shard_id, self.config.shard_id_digits));
        fs::create_dir_all(&dir).map_err(|e| ShardError::Writer(e.to_string()))?;
        Ok(Box::new(FilesWriter {
            dir,
            encode_format: self.config.encode_format.clone(),
            save_caption: self.config.save_caption,
            closed: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SampleMetadata, Status};
    use std::collections::BTreeMap;

    fn meta(key: &str, status: Status) -> SampleMetadata {
        let mut columns = BTreeMap::new();
        columns.insert("url".to_string(), serde_json::json!("http://a"));
        SampleMetadata {
            columns,
            key: key.to_string(),
            status,
            error_message: None,
            width: None,
            height: None,
            original_width: None,
            original_height: None,
            extra: BTreeMap::new(),
        }
    }

    fn factory(dir: &std::path::Path, save_caption: bool) -> FilesWriterFactory {
        FilesWriterFactory::new(ShardConfig {
            output_dir: dir.to_path_buf(),
            save_caption,
            encode_format: "jpg".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_accepted_sample_writes_payload_caption_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path(), true);
        let mut writer = factory.create(3, &["url".to_string()]).unwrap();

        writer
            .write(&ProcessedResult::Accepted {
                payload: vec![1, 2, 3],
                caption: Some("a cat".to_string()),
                meta: meta("00003001", Status::Success),
            })
            .unwrap();
        writer.close().unwrap();

        let shard_dir = dir.path().join("00003");
        assert_eq!(fs::read(shard_dir.join("00003001.jpg")).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            fs::read_to_string(shard_dir.join("00003001.txt")).unwrap(),
            "a cat"
        );
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(shard_dir.join("00003001.json")).unwrap())
                .unwrap();
        assert_eq!(json["key"], "00003001");
        assert_eq!(json["status"], "success");
        assert_eq!(json["url"], "http://a");
    }

    #[test]
    fn test_rejected_sample_writes_only_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path(), false);
        let mut writer = factory.create(0, &["url".to_string()]).unwrap();

        let mut rejected = meta("00000000", Status::FailedToDownload);
        rejected.error_message = Some("HTTP error 404 Not Found".to_string());
        writer
            .write(&ProcessedResult::Rejected {
                caption: None,
                meta: rejected,
            })
            .unwrap();
        writer.close().unwrap();

        let shard_dir = dir.path().join("00000");
        assert!(!shard_dir.join("00000000.jpg").exists());
        assert!(!shard_dir.join("00000000.txt").exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(shard_dir.join("00000000.json")).unwrap())
                .unwrap();
        assert_eq!(json["status"], "failed_to_download");
        assert_eq!(json["error_message"], "HTTP error 404 Not Found");
    }

    #[test]
    fn test_missing_caption_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path(), true);
        let mut writer = factory.create(1, &[]).unwrap();

        writer
            .write(&ProcessedResult::Rejected {
                caption: None,
                meta: meta("00001000", Status::FailedToDownload),
            })
            .unwrap();

        let caption = dir.path().join("00001").join("00001000.txt");
        assert_eq!(fs::read_to_string(caption).unwrap(), "");
    }
}
