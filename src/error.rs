use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

/// Failures of a density filtering run. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("failed to write {path:?}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported point cloud format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilterError {
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedInput(details.into())
    }
}
