//! Crate-local errors, converging into `autolot_core::Error` at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NluError {
    #[error("failed to compile pattern: {0}")]
    Pattern(String),

    #[error("intent classification failed: {0}")]
    Classification(String),
}

pub type Result<T> = std::result::Result<T, NluError>;

impl From<NluError> for autolot_core::Error {
    fn from(err: NluError) -> Self {
        autolot_core::Error::Nlu(err.to_string())
    }
}
