//! Crate-local errors, converging into `autolot_core::Error` at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("classification request failed: {0}")]
    Request(String),

    #[error("invalid classification response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

impl From<LlmError> for autolot_core::Error {
    fn from(err: LlmError) -> Self {
        autolot_core::Error::Llm(err.to_string())
    }
}
