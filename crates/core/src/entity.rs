//! Typed values extracted out of free text by the understanding stage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum EntityType {
    Make,
    Model,
    Derivative,
    Price,
    PriceRange,
    Mileage,
    EngineSize,
    FuelType,
    Transmission,
    BodyType,
    Colour,
    Feature,
    Location,
    Year,
    QualitativeTerm,
}

/// A numeric or date value an entity may carry alongside its raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityValue {
    Number(f64),
    Range(f64, f64),
    Text(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub entity_type: EntityType,
    pub raw_value: String,
    pub value: EntityValue,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    /// Operator inferred from surrounding context words ("under", "over", ...),
    /// if any. Consumed by the Mapper when choosing a constraint's operator.
    pub operator_hint: Option<crate::constraint::Operator>,
}

impl ExtractedEntity {
    pub fn new(entity_type: EntityType, raw_value: impl Into<String>, confidence: f64) -> Self {
        Self {
            entity_type,
            raw_value: raw_value.into(),
            value: EntityValue::None,
            confidence: confidence.clamp(0.0, 1.0),
            start: 0,
            end: 0,
            operator_hint: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_value(mut self, value: EntityValue) -> Self {
        self.value = value;
        self
    }

    pub fn with_operator_hint(mut self, op: crate::constraint::Operator) -> Self {
        self.operator_hint = Some(op);
        self
    }

    /// Character span overlap used by overlap resolution in the extractor.
    pub fn overlaps(&self, other: &ExtractedEntity) -> bool {
        self.start < other.end && other.start < self.end
    }
}
