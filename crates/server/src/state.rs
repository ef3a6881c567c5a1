//! Application state: the pipeline's components wired together, and the
//! per-caller request-timestamp history the Guardrail's rate limit rule
//! consults (spec.md §4.1 — "the caller owns storage and eviction").

use autolot_config::{ConceptTable, FieldTable, Settings};
use autolot_core::{Embedder, LLMClassifier, SearchIndex};
use autolot_llm::HttpLlmClassifier;
use autolot_nlu::{Guardrail, Understanding};
use autolot_query::{Composer, Mapper, Refiner, SessionStore};
use autolot_search::embeddings::EmbeddingConfig;
use autolot_search::{CachingEmbedder, ConceptMapper, HttpEmbedder, HttpSearchIndex, Orchestrator, Ranker};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks every request timestamp per caller (the `X-Session-Id` header, or
/// `"anonymous"` when absent) so the Guardrail can apply its sliding-window
/// rate limit. Entries older than a day are dropped on each touch.
#[derive(Default)]
pub struct RequestTracker {
    history: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now` for `key` and returns the full window (including `now`)
    /// the Guardrail should evaluate against.
    pub fn touch(&self, key: &str, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut history = self.history.write();
        let entry = history.entry(key.to_string()).or_default();
        entry.retain(|ts| now - *ts < Duration::days(1));
        entry.push(now);
        entry.clone()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<Settings>>,
    pub sessions: Arc<SessionStore>,
    pub understanding: Arc<Understanding>,
    pub guardrail: Arc<Guardrail>,
    pub mapper: Arc<Mapper>,
    pub composer: Arc<Composer>,
    pub refiner: Arc<Refiner>,
    pub orchestrator: Arc<Orchestrator>,
    pub ranker: Arc<Ranker>,
    pub concept_mapper: Arc<ConceptMapper>,
    pub search_index: Arc<dyn SearchIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub request_tracker: Arc<RequestTracker>,
    env: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self::with_env(settings, None)
    }

    pub fn with_env(settings: Settings, env: Option<String>) -> Self {
        let fields = FieldTable::default();
        let concepts = match &settings.qualitative_terms_path {
            Some(path) => ConceptTable::from_json_file(std::path::Path::new(path)).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path, "failed to load qualitative terms override, using defaults");
                ConceptTable::default()
            }),
            None => ConceptTable::default(),
        };
        let vocabulary = autolot_config::VocabularyConfig::default();
        let patterns = autolot_config::PatternConfig::default();

        let llm_classifier: Arc<dyn LLMClassifier> = Arc::new(HttpLlmClassifier::new(settings.llm.clone()));
        let understanding = Understanding::new(Some(llm_classifier), patterns.clone(), vocabulary.clone());
        let guardrail = Guardrail::new(patterns, settings.rate_limit.clone(), &vocabulary);

        let embedding_config = EmbeddingConfig {
            endpoint: settings.llm.endpoint.clone(),
            key: settings.llm.key.clone(),
            deployment: settings.llm.embedding_deployment.clone(),
            dimensions: settings.search_index.vector_dimensions,
        };
        let raw_embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(embedding_config));
        let embedder: Arc<dyn Embedder> = Arc::new(CachingEmbedder::new(
            raw_embedder,
            settings.embedding_cache.size,
            std::time::Duration::from_secs(settings.embedding_cache.ttl_secs),
        ));

        let search_index: Arc<dyn SearchIndex> = Arc::new(HttpSearchIndex::new(settings.search_index.clone()));

        let orchestrator = Orchestrator::new(search_index.clone(), embedder.clone(), concepts.clone(), settings.search.clone());
        let ranker = Ranker::new(
            autolot_config::RankerWeights::default(),
            autolot_config::BusinessRuleAdjustments::default(),
            autolot_config::DiversityConfig::default(),
            vocabulary.clone(),
        );

        Self {
            sessions: Arc::new(SessionStore::new(settings.session.timeout(), settings.session.max_messages_per_session)),
            understanding: Arc::new(understanding),
            guardrail: Arc::new(guardrail),
            mapper: Arc::new(Mapper::new(fields.clone(), concepts.clone())),
            composer: Arc::new(Composer::new(fields)),
            refiner: Arc::new(Refiner::new()),
            orchestrator: Arc::new(orchestrator),
            ranker: Arc::new(ranker),
            concept_mapper: Arc::new(ConceptMapper::new(concepts)),
            search_index,
            embedder,
            request_tracker: Arc::new(RequestTracker::new()),
            settings: Arc::new(RwLock::new(settings)),
            env,
        }
    }

    pub fn reload_settings(&self) -> Result<(), String> {
        let reloaded = autolot_config::load_settings(self.env.as_deref()).map_err(|e| e.to_string())?;
        *self.settings.write() = reloaded;
        tracing::info!("configuration reloaded");
        Ok(())
    }

    /// Starts the background sweeper that evicts sessions past their
    /// timeout (spec.md §5: "must not block request-handling threads").
    pub fn spawn_session_sweeper(&self) {
        let sessions = self.sessions.clone();
        let interval = self.settings.read().session.sweep_interval();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                let evicted = sessions.sweep();
                if evicted > 0 {
                    tracing::info!(evicted, "session sweep complete");
                }
            }
        });
    }
}
