//! Executor and ranker output.

use crate::vehicle::Vehicle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreBreakdown {
    pub exact: f64,
    pub semantic: f64,
    pub keyword: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleResult {
    pub vehicle: Vehicle,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Proposed relaxation when a search returns zero rows: names the most
/// restrictive numeric field and a concrete replacement value (spec.md §8
/// S4, SPEC_FULL.md §4 "Zero-result relaxation hints").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationHint {
    pub field: String,
    pub message: String,
    pub suggested_value: f64,
}

impl VehicleResult {
    pub fn new(vehicle: Vehicle, breakdown: ScoreBreakdown) -> Self {
        let score = breakdown.final_score.clamp(0.0, 1.0);
        debug_assert!(score.is_finite());
        Self {
            vehicle,
            score,
            breakdown,
        }
    }
}
