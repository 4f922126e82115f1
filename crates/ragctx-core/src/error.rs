//! Error types for ragctx.

use thiserror::Error;

/// Main error type for ragctx operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration was rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Export failed
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Storage operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Invalid chunking configuration. Raised once, when a config is validated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("chunk sizes must satisfy min <= target <= max (min={min}, target={target}, max={max})")]
    SizeOrdering {
        min: usize,
        target: usize,
        max: usize,
    },

    #[error("{0} must be greater than zero")]
    ZeroSize(&'static str),

    #[error("overlap_size ({overlap}) must be smaller than target_chunk_size ({target})")]
    OverlapTooLarge { overlap: usize, target: usize },

    #[error("overlap_percentage must be within [0, 0.5], got {0}")]
    OverlapPercentage(f64),

    #[error("csv_rows_per_chunk must be greater than zero")]
    InvalidRowBatch,

    #[error("invalid scoring parameter: {0}")]
    Scoring(String),
}

/// Chunking errors. Strategies only fail on malformed format hints.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid format hints: {0}")]
    InvalidHints(String),
}

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("insert failed: {0}")]
    Insert(String),

    #[error("row encoding failed: {0}")]
    Encoding(String),
}

/// Result type alias for ragctx operations.
pub type Result<T> = std::result::Result<T, Error>;
