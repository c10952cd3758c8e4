//! Library error type.

use std::path::PathBuf;

/// Errors surfaced by the octdoc library.
///
/// Per-file and per-tag problems inside a source tree are not errors: they
/// are logged and the offending file or tag is skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown format: {0}. Use html or json")]
    UnknownFormat(String),

    #[error("unknown target: {0}. Use tar or dir")]
    UnknownTarget(String),

    #[error("target dir requires an output directory (-o)")]
    MissingOutput,

    #[error("input is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
