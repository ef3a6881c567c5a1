//! Guardrail and Understanding: turns a raw utterance into either a
//! rejection/warning or a `ParsedQuery` ready for the Mapper.

pub mod entity;
pub mod error;
pub mod fuzzy;
pub mod guardrail;
pub mod intent;
pub mod understanding;

pub use entity::EntityExtractor;
pub use error::{NluError, Result};
pub use guardrail::{Decision, Guardrail, GuardrailVerdict, ViolationCategory};
pub use intent::PatternIntentClassifier;
pub use understanding::Understanding;
