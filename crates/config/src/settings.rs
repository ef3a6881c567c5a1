//! Layered application settings.
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`APP__` prefix, `__` separator)
//! 2. `config/{env}.toml` (if an environment name is given)
//! 3. `config/default.toml`

use crate::constants::{endpoints, search, timeouts};
use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Top-level settings. Every field maps to a "Configuration (recognized
/// options)" entry in spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub embedding_cache: EmbeddingCacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search_index: SearchIndexConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Optional external file overriding the built-in qualitative-concept
    /// table (spec.md §6, `QualitativeTerms`).
    #[serde(default)]
    pub qualitative_terms_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            embedding_cache: EmbeddingCacheConfig::default(),
            search: SearchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            llm: LlmConfig::default(),
            search_index: SearchIndexConfig::default(),
            observability: ObservabilityConfig::default(),
            qualitative_terms_path: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_search()?;
        self.validate_server()?;
        self.validate_rate_limit()?;
        Ok(())
    }

    fn validate_search(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.search.minimum_relevance_score) {
            return Err(ConfigError::InvalidValue {
                field: "search.minimum_relevance_score".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.search.minimum_relevance_score
                ),
            });
        }
        if self.search.max_results_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.max_results_cap".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.search_index.vector_dimensions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search_index.vector_dimensions".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }
        if self.environment.is_production() && self.server.cors_enabled && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured; \
                 this may block legitimate requests"
            );
        }
        Ok(())
    }

    fn validate_rate_limit(&self) -> Result<(), ConfigError> {
        let rl = &self.rate_limit;
        if rl.per_minute_soft_warn == 0 || rl.per_minute_block == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit".to_string(),
                message: "per-minute thresholds must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_request_deadline_ms() -> u64 {
    timeouts::REQUEST_DEADLINE_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            request_deadline_ms: default_request_deadline_ms(),
        }
    }
}

/// Session lifecycle config (spec.md §4.5, §9 "Session-timeout discrepancy" —
/// resolved by making the timeout an explicit config value, default 4 hours).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_messages")]
    pub max_messages_per_session: usize,
}

fn default_session_timeout_secs() -> u64 {
    4 * 60 * 60
}
fn default_max_messages() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout_secs(),
            max_messages_per_session: default_max_messages(),
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.timeout_secs as i64)
    }

    /// Periodic sweeper interval: at most 1/5 of the timeout (spec.md §5).
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs / 5).max(std::time::Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCacheConfig {
    #[serde(default = "default_cache_size")]
    pub size: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_size() -> usize {
    1000
}
fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            size: default_cache_size(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_min_relevance")]
    pub minimum_relevance_score: f64,
    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: usize,
}

fn default_min_relevance() -> f64 {
    search::MINIMUM_RELEVANCE_SCORE
}
fn default_max_results_cap() -> usize {
    search::MAX_RESULTS_CAP
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            minimum_relevance_score: default_min_relevance(),
            max_results_cap: default_max_results_cap(),
        }
    }
}

/// Sliding-window rate limiting (spec.md §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_per_minute_soft_warn")]
    pub per_minute_soft_warn: u32,
    #[serde(default = "default_per_minute_block")]
    pub per_minute_block: u32,
    #[serde(default = "default_per_minute_block_secs")]
    pub per_minute_block_secs: u64,
    #[serde(default = "default_per_hour")]
    pub per_hour: u32,
    #[serde(default = "default_per_hour_block_secs")]
    pub per_hour_block_secs: u64,
    #[serde(default = "default_per_day")]
    pub per_day: u32,
}

fn default_per_minute_soft_warn() -> u32 {
    10
}
fn default_per_minute_block() -> u32 {
    15
}
fn default_per_minute_block_secs() -> u64 {
    30
}
fn default_per_hour() -> u32 {
    100
}
fn default_per_hour_block_secs() -> u64 {
    10 * 60
}
fn default_per_day() -> u32 {
    500
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute_soft_warn: default_per_minute_soft_warn(),
            per_minute_block: default_per_minute_block(),
            per_minute_block_secs: default_per_minute_block_secs(),
            per_hour: default_per_hour(),
            per_hour_block_secs: default_per_hour_block_secs(),
            per_day: default_per_day(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub chat_deployment: Option<String>,
    #[serde(default)]
    pub embedding_deployment: Option<String>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.clone()
}
fn default_max_concurrent() -> usize {
    4
}
fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            key: None,
            chat_deployment: None,
            embedding_deployment: None,
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexConfig {
    #[serde(default = "default_search_index_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_vector_dimensions")]
    pub vector_dimensions: usize,
}

fn default_search_index_endpoint() -> String {
    endpoints::SEARCH_INDEX_DEFAULT.clone()
}
fn default_index_name() -> String {
    "vehicles".to_string()
}
fn default_vector_dimensions() -> usize {
    384
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_index_endpoint(),
            key: None,
            index_name: default_index_name(),
            vector_dimensions: default_vector_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

/// Load settings from files and environment.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.session.timeout_secs, 4 * 60 * 60);
    }

    #[test]
    fn rejects_out_of_range_relevance_score() {
        let mut settings = Settings::default();
        settings.search.minimum_relevance_score = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn sweep_interval_is_fifth_of_timeout() {
        let settings = SessionConfig {
            timeout_secs: 1000,
            max_messages_per_session: 100,
        };
        assert_eq!(settings.sweep_interval(), std::time::Duration::from_secs(200));
    }
}
