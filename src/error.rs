//! Error types for the imgshard pipeline.
//!
//! Only structural failures surface as errors: unreadable shards, writer
//! construction failures, invalid configuration. Per-row failures are data —
//! they travel through the pipeline as `Rejected` results with a status and a
//! human-readable message, never as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgshard operations.
#[derive(Error, Debug)]
pub enum ImgshardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shard-level structural errors
    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Shard-level structural errors. Any of these aborts the shard (the caller
/// may retry the whole shard); none of them crashes the process.
#[derive(Error, Debug)]
pub enum ShardError {
    /// Backing storage could not be read or removed
    #[error("Storage error for {path}: {message}")]
    Storage { path: PathBuf, message: String },

    /// Shard bytes could not be decoded into a column table
    #[error("Decode error: {0}")]
    Decode(String),

    /// A required column is missing from the shard
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The per-shard sample writer failed
    #[error("Writer error: {0}")]
    Writer(String),

    /// The stats sink failed
    #[error("Stats error: {0}")]
    Stats(String),
}

/// Convenience type alias for imgshard results.
pub type Result<T> = std::result::Result<T, ImgshardError>;

/// Convenience type alias for shard-level results.
pub type ShardResult<T> = std::result::Result<T, ShardError>;
