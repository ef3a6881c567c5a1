//! Crate-local errors, converging into `autolot_core::Error` at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("session not found")]
    SessionNotFound,

    #[error("filter expression invalid: {0}")]
    InvalidFilter(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;

impl From<QueryError> for autolot_core::Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::SessionNotFound => autolot_core::Error::SessionNotFound,
            QueryError::InvalidFilter(msg) => autolot_core::Error::Query(msg),
        }
    }
}
