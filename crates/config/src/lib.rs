//! Configuration for the vehicle search service.
//!
//! Supports loading layered settings from:
//! - `config/default.toml` / `config/{env}.toml`
//! - `APP__`-prefixed environment variables
//!
//! Also hosts the static domain tables the pipeline consults: vocabulary
//! dictionaries, guardrail/extraction patterns, the qualitative concept
//! table, the entity→field mapping whitelist, and the ranker's business
//! rule constants.

pub mod business_rules;
pub mod concepts;
pub mod constants;
pub mod fields;
pub mod patterns;
pub mod settings;
pub mod vocabulary;

pub use business_rules::{BusinessRuleAdjustments, DiversityConfig, RankerWeights};
pub use concepts::{ConceptDefinition, ConceptTable};
pub use fields::{FieldMapping, FieldTable};
pub use patterns::{OperatorKeyword, PatternConfig};
pub use settings::{
    load_settings, EmbeddingCacheConfig, LlmConfig, ObservabilityConfig, RateLimitConfig,
    RuntimeEnvironment, SearchConfig, SearchIndexConfig, ServerConfig, SessionConfig, Settings,
};
pub use vocabulary::{DictionaryEntry, VocabularyConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for autolot_core::Error {
    fn from(err: ConfigError) -> Self {
        autolot_core::Error::PermanentDependency(err.to_string())
    }
}
