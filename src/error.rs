//! Error types for the file-facing edges of the crate.
//!
//! The metrics core itself is infallible: recording, aggregation,
//! classification and report assembly never return errors. Failures only
//! arise when exporting, loading configuration, or sampling timings.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerfError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timing sample failed: {0}")]
    Sample(String),
}

pub type Result<T> = std::result::Result<T, PerfError>;
