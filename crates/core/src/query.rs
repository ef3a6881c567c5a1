//! Understanding, Mapper, and Composer outputs: the staged query
//! representations that flow from raw text through to a backend filter
//! expression.

use crate::constraint::SearchConstraint;
use crate::entity::ExtractedEntity;
use crate::traits::ClassifiedIntent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output of the Understanding stage (intent classification + entity
/// extraction) for a single turn, before the Mapper resolves entities into
/// constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub utterance: String,
    pub intent: ClassifiedIntent,
    pub intent_confidence: f64,
    pub entities: Vec<ExtractedEntity>,
}

impl ParsedQuery {
    pub fn new(utterance: impl Into<String>, intent: ClassifiedIntent, intent_confidence: f64) -> Self {
        Self {
            utterance: utterance.into(),
            intent,
            intent_confidence: intent_confidence.clamp(0.0, 1.0),
            entities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedQuery {
    pub constraints: Vec<SearchConstraint>,
    pub unmappable_terms: Vec<String>,
    pub metadata: HashMap<String, String>,
}

impl MappedQuery {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
            unmappable_terms: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn has_or_operator(&self) -> bool {
        self.metadata
            .get("hasOrOperator")
            .map(|v| v == "true")
            .unwrap_or(false)
    }
}

impl Default for MappedQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGroup {
    pub constraints: Vec<SearchConstraint>,
    pub op: LogicalOp,
    pub priority: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    Simple,
    Filtered,
    Complex,
    MultiModal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedQuery {
    pub groups: Vec<ConstraintGroup>,
    pub inter_group_op: LogicalOp,
    pub warnings: Vec<String>,
    pub has_conflicts: bool,
    pub filter_expression: String,
    pub query_type: QueryType,
}

impl ComposedQuery {
    /// All constraints across all groups, flattened — used by the ranker's
    /// exact-match-count factor and by diversity's make/model Eq check.
    pub fn all_constraints(&self) -> impl Iterator<Item = &SearchConstraint> {
        self.groups.iter().flat_map(|g| g.constraints.iter())
    }

    pub fn is_valid(&self) -> bool {
        !self.has_conflicts && !self.filter_expression.is_empty()
    }
}
