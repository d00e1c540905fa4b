//! Local-filesystem shard storage.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{ShardError, ShardResult};

use super::ShardStorage;

/// Shard storage backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage_error(path: &Path, e: std::io::Error) -> ShardError {
        ShardError::Storage {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ShardStorage for FsStorage {
    async fn open(&self, path: &Path) -> ShardResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| Self::storage_error(path, e))
    }

    async fn remove(&self, path: &Path) -> ShardResult<()> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| Self::storage_error(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00000.jsonl");
        std::fs::write(&path, b"hello").unwrap();

        let storage = FsStorage::new();
        assert_eq!(storage.open(&path).await.unwrap(), b"hello");
        storage.remove(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_shard_is_storage_error() {
        let storage = FsStorage::new();
        let err = storage.open(Path::new("/nonexistent/shard")).await.unwrap_err();
        assert!(matches!(err, ShardError::Storage { .. }));
    }
}
