//! HTTP-backed LLM intent classifier (spec.md §4.2): an optional capability
//! the Understanding stage falls back to when the pattern classifier isn't
//! confident enough. Absent or failing, the pipeline degrades to patterns
//! alone.

pub mod classifier;
pub mod error;

pub use classifier::HttpLlmClassifier;
pub use error::{LlmError, Result};
