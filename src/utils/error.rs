//! Tool-level error handling.
//!
//! Analysis problems in user source are [`Diagnostic`](super::Diagnostic)
//! values, not errors; this type only covers failures of the tool itself.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown pipeline: {0}")]
    UnknownPipeline(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
