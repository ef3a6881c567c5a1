//! Root error type for the vehicle search core.
//!
//! Every other crate owns its own `XxxError` and converges into this type
//! via `From` impls at crate boundaries, mirroring how `RagError`/`AgentError`
//! converge into the core error type in the teacher's workspace.

use thiserror::Error;

/// The four error kinds the pipeline distinguishes when deciding how to
/// respond to the caller and whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input, unknown session, safety violation. Never retried.
    User,
    /// 429/5xx from an external dependency, timeout, socket error. Retried
    /// with backoff by the caller; surfaced as 503 after exhaustion.
    TransientDependency,
    /// Missing config, absent index, dimension mismatch. Not retried.
    PermanentDependency,
    /// A constraint invariant was violated internally (NaN score, operator/
    /// value mismatch, empty filter after a successful compose).
    InternalInvariantViolation,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("query rejected: {0}")]
    Guardrail(String),

    #[error("dependency unavailable: {0}")]
    TransientDependency(String),

    #[error("dependency misconfigured: {0}")]
    PermanentDependency(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),

    #[error("nlu error: {0}")]
    Nlu(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("llm error: {0}")]
    Llm(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) | Error::SessionNotFound | Error::Guardrail(_) => {
                ErrorKind::User
            }
            Error::TransientDependency(_) => ErrorKind::TransientDependency,
            Error::PermanentDependency(_) => ErrorKind::PermanentDependency,
            Error::Invariant(_) => ErrorKind::InternalInvariantViolation,
            Error::Nlu(_) | Error::Query(_) | Error::Search(_) | Error::Llm(_) => {
                ErrorKind::InternalInvariantViolation
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
