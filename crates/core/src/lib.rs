//! Core domain types and capability traits for the vehicle search service.
//!
//! This crate provides the foundations used across every other crate:
//! - The vehicle record and the data model the pipeline passes between
//!   stages (entities, constraints, queries, strategies, results)
//! - Conversation session state
//! - Capability traits for the external collaborators (embedder, search
//!   index, LLM classifier)
//! - The root error type

pub mod concept;
pub mod constraint;
pub mod entity;
pub mod error;
pub mod query;
pub mod result;
pub mod session;
pub mod strategy;
pub mod traits;
pub mod vehicle;

pub use concept::{
    AttributeWeight, ComparisonType, ExplainedScore, ScoreComponent, SimilarityScore,
};
pub use constraint::{ConstraintKind, ConstraintValue, Operator, ScalarValue, SearchConstraint};
pub use entity::{EntityType, EntityValue, ExtractedEntity};
pub use error::{Error, ErrorKind, Result};
pub use query::{ComposedQuery, ConstraintGroup, LogicalOp, MappedQuery, ParsedQuery, QueryType};
pub use result::{RelaxationHint, ScoreBreakdown, VehicleResult};
pub use session::{ConversationMessage, ConversationSession, LastResultRef, Role, SearchState};
pub use strategy::{SearchStrategy, StrategyType};
pub use traits::{
    ClassifiedIntent, Embedder, IndexHit, IndexQuery, IntentClassification, LLMClassifier,
    NoOpClassifier, SearchIndex,
};
pub use vehicle::Vehicle;
