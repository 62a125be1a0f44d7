use std::io;

use thiserror::Error;

/// Failures across the indexing and query pipeline.
///
/// `Resource` is always fatal to the current run. `Page` covers a single
/// unreadable page file and is handled by skipping that page. `Format` is a
/// malformed index file line, recovered by truncating at the last complete
/// posting pair. `Query` rejects one query line and lets the session continue.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("resource error: {0}")]
    Resource(String),

    #[error("page {id}: {reason}")]
    Page { id: u64, reason: String },

    #[error("index format error: {0}")]
    Format(String),

    #[error("invalid query: {0}")]
    Query(String),
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Resource(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
