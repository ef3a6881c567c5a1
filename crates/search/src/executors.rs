//! Exact, semantic, and hybrid executors (spec.md §4.6): each turns a
//! `ComposedQuery` into vehicles via the injected `SearchIndex`, scored
//! according to its strategy.

use autolot_config::{constants::search as search_constants, ConceptTable, SearchConfig};
use autolot_core::{
    ComposedQuery, ConstraintKind, ConstraintValue, Embedder, Error, IndexQuery, Result, ScalarValue,
    ScoreBreakdown, SearchIndex, SearchStrategy, VehicleResult,
};
use std::sync::Arc;

/// Runs `composed` against the index with no vector leg: the filter
/// expression alone decides membership, every hit carries a uniform score
/// of 1.0, and results are ordered by price ascending (spec.md §4.6).
pub struct ExactExecutor {
    index: Arc<dyn SearchIndex>,
}

impl ExactExecutor {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    pub async fn execute(&self, composed: &ComposedQuery, top_k: usize) -> Result<Vec<VehicleResult>> {
        let hits = self
            .index
            .search(IndexQuery { filter_expression: &composed.filter_expression, text: None, vector: None, top_k })
            .await?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(vehicle) = self.index.get(&hit.id).await? {
                let breakdown = ScoreBreakdown { exact: 1.0, semantic: 0.0, keyword: 0.0, final_score: 1.0 };
                results.push(VehicleResult::new(vehicle, breakdown));
            }
        }

        results.sort_by(|a, b| a.vehicle.price.partial_cmp(&b.vehicle.price).unwrap());
        Ok(results)
    }
}

/// Runs a kNN vector query built from the Semantic constraints' values and
/// their concept's indicator phrases, over-fetching 3x before floor-filtering
/// by `minimum_relevance_score` (spec.md §4.6).
pub struct SemanticExecutor {
    index: Arc<dyn SearchIndex>,
    embedder: Arc<dyn Embedder>,
    concepts: ConceptTable,
    config: SearchConfig,
}

impl SemanticExecutor {
    pub fn new(index: Arc<dyn SearchIndex>, embedder: Arc<dyn Embedder>, concepts: ConceptTable, config: SearchConfig) -> Self {
        Self { index, embedder, concepts, config }
    }

    pub async fn execute(&self, composed: &ComposedQuery, top_k: usize) -> Result<Vec<VehicleResult>> {
        let text = semantic_query_text(composed, &self.concepts);
        let embedding = self.embedder.embed(&text).await?;
        if embedding.len() != self.index.vector_dimensions() {
            return Err(Error::Invariant(format!(
                "embedder produced {} dimensions, index expects {}",
                embedding.len(),
                self.index.vector_dimensions()
            )));
        }

        let overfetch = top_k * search_constants::SEMANTIC_OVERFETCH_FACTOR;
        let hits = self
            .index
            .search(IndexQuery { filter_expression: "", text: None, vector: Some(&embedding), top_k: overfetch })
            .await?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if (hit.score as f64) < self.config.minimum_relevance_score {
                continue;
            }
            if let Some(vehicle) = self.index.get(&hit.id).await? {
                let breakdown = ScoreBreakdown {
                    exact: 0.0,
                    semantic: hit.score as f64,
                    keyword: 0.0,
                    final_score: hit.score as f64,
                };
                results.push(VehicleResult::new(vehicle, breakdown));
            }
            if results.len() >= top_k {
                break;
            }
        }

        Ok(results)
    }
}

/// Issues one fused text+vector query, relying on the backend's own RRF;
/// falls back to a local RRF merge over separate text/vector queries when
/// `force_local_fusion` is set (spec.md §4.6).
pub struct HybridExecutor {
    index: Arc<dyn SearchIndex>,
    embedder: Arc<dyn Embedder>,
    concepts: ConceptTable,
    config: SearchConfig,
    force_local_fusion: bool,
}

impl HybridExecutor {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        embedder: Arc<dyn Embedder>,
        concepts: ConceptTable,
        config: SearchConfig,
        force_local_fusion: bool,
    ) -> Self {
        Self { index, embedder, concepts, config, force_local_fusion }
    }

    pub async fn execute(&self, composed: &ComposedQuery, strategy: &SearchStrategy, top_k: usize) -> Result<Vec<VehicleResult>> {
        let text = semantic_query_text(composed, &self.concepts);
        let embedding = self.embedder.embed(&text).await?;

        if !self.force_local_fusion {
            let hits = self
                .index
                .search(IndexQuery {
                    filter_expression: &composed.filter_expression,
                    text: Some(&text),
                    vector: Some(&embedding),
                    top_k,
                })
                .await?;

            let mut results = Vec::with_capacity(hits.len());
            for hit in hits {
                if let Some(vehicle) = self.index.get(&hit.id).await? {
                    let breakdown = ScoreBreakdown {
                        exact: strategy.weight_of("exact"),
                        semantic: strategy.weight_of("semantic"),
                        keyword: 0.0,
                        final_score: hit.score as f64,
                    };
                    results.push(VehicleResult::new(vehicle, breakdown));
                }
            }
            return Ok(results);
        }

        let exact_weight = strategy.weight_of("exact");
        let semantic_weight = strategy.weight_of("semantic");

        let (text_hits, vector_hits) = tokio::try_join!(
            self.index.search(IndexQuery {
                filter_expression: &composed.filter_expression,
                text: Some(&text),
                vector: None,
                top_k: top_k * 2,
            }),
            self.index.search(IndexQuery { filter_expression: "", text: None, vector: Some(&embedding), top_k: top_k * 2 }),
        )?;

        let fused = reciprocal_rank_fusion(&text_hits, &vector_hits, exact_weight, semantic_weight);

        let mut results = Vec::with_capacity(fused.len().min(top_k));
        for (id, score) in fused.into_iter().take(top_k) {
            if let Some(vehicle) = self.index.get(&id).await? {
                let breakdown = ScoreBreakdown { exact: exact_weight, semantic: semantic_weight, keyword: 0.0, final_score: score };
                results.push(VehicleResult::new(vehicle, breakdown));
            }
        }
        Ok(results)
    }
}

/// Merges two ranked id lists with weighted Reciprocal Rank Fusion:
/// `score(d) = Σ w_i / (k + rank_i(d))` (spec.md §4.6).
fn reciprocal_rank_fusion(
    text_hits: &[autolot_core::IndexHit],
    vector_hits: &[autolot_core::IndexHit],
    text_weight: f64,
    vector_weight: f64,
) -> Vec<(String, f64)> {
    use std::collections::HashMap;

    let mut scores: HashMap<String, f64> = HashMap::new();
    for (rank, hit) in text_hits.iter().enumerate() {
        *scores.entry(hit.id.clone()).or_insert(0.0) += text_weight / (search_constants::RRF_K + (rank + 1) as f64);
    }
    for (rank, hit) in vector_hits.iter().enumerate() {
        *scores.entry(hit.id.clone()).or_insert(0.0) += vector_weight / (search_constants::RRF_K + (rank + 1) as f64);
    }

    let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    ranked
}

fn semantic_query_text(composed: &ComposedQuery, concepts: &ConceptTable) -> String {
    let mut terms: Vec<String> = Vec::new();
    let mut seen_concepts = std::collections::HashSet::new();

    for constraint in composed.all_constraints() {
        if constraint.kind != ConstraintKind::Semantic {
            continue;
        }
        if let Some(term) = &constraint.originating_term {
            if seen_concepts.insert(term.clone()) {
                terms.push(term.clone());
                if let Some(concept) = concepts.get(term) {
                    terms.extend(concept.positive_indicators.iter().take(2).cloned());
                }
            }
        }
        terms.push(scalar_text(&constraint.value));
    }

    terms.join(" ")
}

fn scalar_text(value: &ConstraintValue) -> String {
    match value {
        ConstraintValue::Scalar(ScalarValue::Text(t)) => t.clone(),
        ConstraintValue::Scalar(ScalarValue::Number(n)) => n.to_string(),
        ConstraintValue::Scalar(ScalarValue::Bool(b)) => b.to_string(),
        ConstraintValue::Pair(a, b) => format!("{} {}", scalar_inner(a), scalar_inner(b)),
        ConstraintValue::Set(values) => values.iter().map(scalar_inner).collect::<Vec<_>>().join(" "),
    }
}

fn scalar_inner(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Text(t) => t.clone(),
        ScalarValue::Number(n) => n.to_string(),
        ScalarValue::Bool(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolot_core::IndexHit;

    #[test]
    fn rrf_favors_documents_ranked_highly_in_both_lists() {
        let text_hits = vec![
            IndexHit { id: "a".to_string(), score: 0.9 },
            IndexHit { id: "b".to_string(), score: 0.8 },
        ];
        let vector_hits = vec![
            IndexHit { id: "b".to_string(), score: 0.95 },
            IndexHit { id: "c".to_string(), score: 0.7 },
        ];
        let fused = reciprocal_rank_fusion(&text_hits, &vector_hits, 0.5, 0.5);
        assert_eq!(fused[0].0, "b");
    }
}
