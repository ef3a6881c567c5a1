//! Capability traits for the external collaborators the core depends on:
//! an embedding model, a search+vector index, and an optional LLM intent
//! classifier. Every pipeline stage receives these by dependency injection
//! (spec.md §9, "Global session map" design note applies equally here —
//! never reach for a global instance).

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns free text into a fixed-dimension embedding vector.
///
/// Implementations:
/// - an HTTP-backed embedder calling an external embedding deployment
/// - a caching decorator wrapping either of the above (§6: "the core wraps
///   it in a caching decorator")
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed `text` into a vector of `dimensions()` floats. Deterministic
    /// within a model version.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The fixed embedding dimension this embedder produces. Must match
    /// `SearchIndex::vector_dimensions` (spec.md §9, vector dimension
    /// invariant).
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str {
        "embedder"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    /// Raw backend score. Exact-only queries carry a uniform 1.0;
    /// semantic/hybrid queries carry the backend's similarity or fused score.
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct IndexQuery<'a> {
    /// Backend filter expression string (OData-shaped; see the Composer's
    /// filter-expression translator). Empty means "no filter".
    pub filter_expression: &'a str,
    /// Text to search with a keyword/BM25-style match, if any.
    pub text: Option<&'a str>,
    /// Query embedding for a kNN vector leg, if any.
    pub vector: Option<&'a [f32]>,
    pub top_k: usize,
}

/// A document store supporting filter-only, kNN vector, and fused text+vector
/// queries against a named vector field (spec.md §6).
#[async_trait]
pub trait SearchIndex: Send + Sync + 'static {
    /// Execute `query`. When both `text` and `vector` are set the backend is
    /// expected to fuse the two ranked lists via Reciprocal Rank Fusion; if
    /// the backend cannot do this the caller falls back to a local RRF merge.
    async fn search(&self, query: IndexQuery<'_>) -> Result<Vec<IndexHit>>;

    /// Fetch a single document (Vehicle) by stable id.
    async fn get(&self, id: &str) -> Result<Option<crate::vehicle::Vehicle>>;

    /// The dimension of the index's `descriptionVector` field.
    fn vector_dimensions(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClassifiedIntent {
    Search,
    Refine,
    Compare,
    Information,
    OffTopic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: ClassifiedIntent,
    pub confidence: f64,
}

/// Optional LLM-backed intent classifier. The core degrades gracefully to
/// pattern matching when this is absent or failing (spec.md §9).
#[async_trait]
pub trait LLMClassifier: Send + Sync + 'static {
    async fn classify(
        &self,
        text: &str,
        previous_text: Option<&str>,
    ) -> Result<IntentClassification>;

    fn name(&self) -> &str {
        "llm-classifier"
    }
}

/// A classifier that never succeeds, forcing the regex fallback path. Used
/// when no LLM capability is configured and in tests that must run without
/// network (spec.md §9).
pub struct NoOpClassifier;

#[async_trait]
impl LLMClassifier for NoOpClassifier {
    async fn classify(
        &self,
        _text: &str,
        _previous_text: Option<&str>,
    ) -> Result<IntentClassification> {
        Err(crate::Error::TransientDependency(
            "no LLM classifier configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "noop-classifier"
    }
}
