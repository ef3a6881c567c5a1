//! Centralized constants: single source of truth for default values that
//! are not user-facing configuration knobs but appear in more than one
//! module.

/// Service endpoints, loaded from env vars with fallback defaults.
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Default search index endpoint (env: SEARCH_INDEX_URL).
    pub static SEARCH_INDEX_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("SEARCH_INDEX_URL").unwrap_or_else(|_| "http://127.0.0.1:6333".to_string())
    });

    /// Default embedding/LLM endpoint (env: LLM_URL).
    pub static LLM_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("LLM_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string())
    });
}

/// Search and ranking tuning constants.
pub mod search {
    /// Reciprocal Rank Fusion constant k (spec.md §4.6).
    pub const RRF_K: f64 = 60.0;

    /// Floor below which a semantic result is dropped (spec.md §4.6).
    pub const MINIMUM_RELEVANCE_SCORE: f64 = 0.50;

    /// Every executor caps results at this count (spec.md §4.6).
    pub const MAX_RESULTS_CAP: usize = 100;

    /// Overfetch multiplier for the semantic executor before applying the
    /// relevance floor (spec.md §4.6).
    pub const SEMANTIC_OVERFETCH_FACTOR: usize = 3;
}

/// Default request-level deadlines (spec.md §5).
pub mod timeouts {
    /// End-to-end request deadline (milliseconds).
    pub const REQUEST_DEADLINE_MS: u64 = 3_000;
}

/// Diversity defaults (spec.md §4.8).
pub mod diversity {
    pub const MAX_PER_MAKE: usize = 3;
    pub const MAX_PER_MODEL: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_constants_in_range() {
        assert!(search::MINIMUM_RELEVANCE_SCORE >= 0.0 && search::MINIMUM_RELEVANCE_SCORE <= 1.0);
        assert!(search::RRF_K > 0.0);
    }
}
