//! Error types for the ingest tools

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection, found {0:?}")]
    NotAFeatureCollection(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
