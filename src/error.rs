use std::path::PathBuf;
use thiserror::Error;

/// Per-object resource failures. These never abort a reconciliation pass;
/// the owning record is skipped until its payload changes again.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("font data could not be parsed")]
    FontUnavailable,
    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),
}
