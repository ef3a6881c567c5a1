//! Concept mapper output types: similarity against a qualitative concept,
//! and the explained score surfaced to the client.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonType {
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Equals,
    In,
    Contains,
    ContainsAny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeWeight {
    pub attribute_name: String,
    pub weight: f64,
    pub target_value: crate::constraint::ScalarValue,
    pub comparison_type: ComparisonType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub overall: f64,
    pub component_scores: HashMap<String, f64>,
    pub matching_attributes: Vec<String>,
    pub mismatching_attributes: Vec<String>,
    pub description_boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: String,
    pub score: f64,
    pub weight: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedScore {
    pub score: f64,
    pub explanation: String,
    pub components: Vec<ScoreComponent>,
}
