//! Regex and lexeme tables driving the Guardrail (spec.md §4.1) and the
//! entity extractor's operator inference (spec.md §4.2).

use autolot_core::Operator;

/// Keyword -> operator table consulted when inferring the operator for a
/// Price/Mileage entity from surrounding context (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct OperatorKeyword {
    pub phrase: &'static str,
    pub operator: Operator,
    /// Extra tolerance applied for "around/about/approximately" style
    /// phrases, expressed as a fraction (0.10 == ±10%).
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub operator_keywords: Vec<OperatorKeyword>,
    /// First-match-wins injection patterns (spec.md §4.1).
    pub injection_patterns: Vec<&'static str>,
    /// Curated profanity blocklist (spec.md §4.1).
    pub profanity_blocklist: Vec<&'static str>,
    /// "all"/"every"/"entire" style bulk-extraction keywords (spec.md §4.1).
    pub bulk_extraction_keywords: Vec<&'static str>,
    /// PII-probing phrases: seller/owner contact, plate lookups (spec.md §4.1).
    pub pii_patterns: Vec<&'static str>,
    /// Maximum utterance length before the Guardrail's Length rule fires.
    pub max_utterance_length: usize,
    /// "low mileage" marker value (spec.md §4.2).
    pub low_mileage_marker: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            operator_keywords: vec![
                OperatorKeyword { phrase: "under", operator: Operator::Le, tolerance: None },
                OperatorKeyword { phrase: "below", operator: Operator::Le, tolerance: None },
                OperatorKeyword { phrase: "up to", operator: Operator::Le, tolerance: None },
                OperatorKeyword { phrase: "less than", operator: Operator::Lt, tolerance: None },
                OperatorKeyword { phrase: "fewer than", operator: Operator::Lt, tolerance: None },
                OperatorKeyword { phrase: "over", operator: Operator::Ge, tolerance: None },
                OperatorKeyword { phrase: "above", operator: Operator::Ge, tolerance: None },
                OperatorKeyword { phrase: "at least", operator: Operator::Ge, tolerance: None },
                OperatorKeyword { phrase: "more than", operator: Operator::Gt, tolerance: None },
                OperatorKeyword { phrase: "greater than", operator: Operator::Gt, tolerance: None },
                OperatorKeyword { phrase: "between", operator: Operator::Between, tolerance: None },
                OperatorKeyword { phrase: "from", operator: Operator::Between, tolerance: None },
                OperatorKeyword { phrase: "around", operator: Operator::Between, tolerance: Some(0.10) },
                OperatorKeyword { phrase: "about", operator: Operator::Between, tolerance: Some(0.10) },
                OperatorKeyword { phrase: "approximately", operator: Operator::Between, tolerance: Some(0.10) },
                OperatorKeyword { phrase: "roughly", operator: Operator::Between, tolerance: Some(0.10) },
                OperatorKeyword { phrase: "exactly", operator: Operator::Eq, tolerance: None },
                OperatorKeyword { phrase: "is", operator: Operator::Eq, tolerance: None },
            ],
            injection_patterns: vec![
                "ignore previous instructions",
                "ignore all previous instructions",
                "developer mode",
                "system prompt",
                "you are now",
                "<script",
                "drop table",
                "--",
                "; select ",
            ],
            profanity_blocklist: vec![
                // Curated per-deployment blocklist; intentionally minimal here.
                "damn", "hell",
            ],
            bulk_extraction_keywords: vec!["all", "every", "entire", "list every"],
            pii_patterns: vec![
                "seller's phone",
                "owner's phone",
                "seller contact",
                "owner contact",
                "registration lookup",
                "plate lookup",
                "look up plate",
            ],
            max_utterance_length: 500,
            low_mileage_marker: 30_000.0,
        }
    }
}

impl PatternConfig {
    pub fn operator_for_phrase(&self, phrase: &str) -> Option<&OperatorKeyword> {
        let lower = phrase.to_lowercase();
        self.operator_keywords
            .iter()
            .find(|k| lower.contains(k.phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_maps_to_le() {
        let patterns = PatternConfig::default();
        let kw = patterns.operator_for_phrase("under £20,000").unwrap();
        assert_eq!(kw.operator, Operator::Le);
    }

    #[test]
    fn around_carries_tolerance() {
        let patterns = PatternConfig::default();
        let kw = patterns.operator_for_phrase("around 15k").unwrap();
        assert_eq!(kw.tolerance, Some(0.10));
    }
}
