use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a scan before it produces an index.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root is missing or can no longer be read (e.g. permission revoked).
    #[error("library root unavailable: {path}: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a scan cache could not be used.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cache document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inconsistent cache: {0}")]
    Invalid(String),
}
