// crates/songlake-core/src/error.rs

use songlake_bucket::BucketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read configuration file: {0}")]
    ConfigFile(#[from] ini::Error),

    #[error("Invalid storage location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Storage operation failed: {0}")]
    Bucket(#[from] BucketError),

    #[error("Failed to load records from '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("Table '{0}' not found in output storage")]
    MissingTable(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
