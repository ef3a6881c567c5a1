//! Crate-local errors, converging into `autolot_core::Error` at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("search index request failed: {0}")]
    Index(String),

    #[error("vector dimension mismatch: embedder produces {embedder}, index expects {index}")]
    DimensionMismatch { embedder: usize, index: usize },
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<SearchError> for autolot_core::Error {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::DimensionMismatch { .. } => autolot_core::Error::Invariant(err.to_string()),
            other => autolot_core::Error::Search(other.to_string()),
        }
    }
}
