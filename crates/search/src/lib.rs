//! Search: the Concept mapper, HTTP-backed Embedder/SearchIndex
//! implementations, executors, Orchestrator, and Ranker (spec.md §4.6-§4.8,
//! §6).

pub mod concept_mapper;
pub mod embeddings;
pub mod error;
pub mod executors;
pub mod orchestrator;
pub mod ranker;
pub mod search_index;

pub use concept_mapper::ConceptMapper;
pub use embeddings::{CachingEmbedder, EmbeddingConfig, HttpEmbedder, SimpleEmbedder};
pub use error::{Result, SearchError};
pub use executors::{ExactExecutor, HybridExecutor, SemanticExecutor};
pub use orchestrator::Orchestrator;
pub use ranker::Ranker;
pub use search_index::HttpSearchIndex;
