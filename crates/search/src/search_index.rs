//! HTTP-backed `SearchIndex`: calls an external search service supporting
//! OData-style filters, BM25 text search, and kNN vector search fused via
//! the backend's own Reciprocal Rank Fusion (spec.md §6, §4.6).

use async_trait::async_trait;
use autolot_config::SearchIndexConfig;
use autolot_core::{Error, IndexHit, IndexQuery, Result, SearchIndex, Vehicle};

/// The vector field name on the indexed document, per spec.md §6.
const VECTOR_FIELD: &str = "descriptionVector";

pub struct HttpSearchIndex {
    client: reqwest::Client,
    config: SearchIndexConfig,
}

impl HttpSearchIndex {
    pub fn new(config: SearchIndexConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    fn documents_url(&self) -> String {
        format!("{}/indexes/{}/docs/search", self.config.endpoint, self.config.index_name)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/indexes/{}/docs/{}", self.config.endpoint, self.config.index_name, id)
    }
}

#[derive(serde::Serialize)]
struct VectorQuery<'a> {
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(serde::Serialize)]
struct SearchRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    filter: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "vectorQueries")]
    vector_queries: Option<Vec<VectorQuery<'a>>>,
    top: usize,
}

#[derive(serde::Deserialize)]
struct SearchResponse {
    value: Vec<SearchHit>,
}

#[derive(serde::Deserialize)]
struct SearchHit {
    id: String,
    #[serde(rename = "@search.score")]
    score: f32,
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn search(&self, query: IndexQuery<'_>) -> Result<Vec<IndexHit>> {
        let vector_queries = query
            .vector
            .map(|v| vec![VectorQuery { vector: v, k: query.top_k, fields: VECTOR_FIELD }]);

        let body = SearchRequest {
            search: query.text,
            filter: query.filter_expression,
            vector_queries,
            top: query.top_k,
        };

        let mut request = self.client.post(self.documents_url()).json(&body);
        if let Some(key) = &self.config.key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::TransientDependency(format!("search index request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::TransientDependency(format!("search index returned {}", response.status())));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::PermanentDependency(format!("unparseable search response: {e}")))?;

        Ok(parsed.value.into_iter().map(|h| IndexHit { id: h.id, score: h.score }).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Vehicle>> {
        let mut request = self.client.get(self.document_url(id));
        if let Some(key) = &self.config.key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::TransientDependency(format!("search index request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::TransientDependency(format!("search index returned {}", response.status())));
        }

        let vehicle: Vehicle = response
            .json()
            .await
            .map_err(|e| Error::PermanentDependency(format!("unparseable vehicle document: {e}")))?;

        Ok(Some(vehicle))
    }

    fn vector_dimensions(&self) -> usize {
        self.config.vector_dimensions
    }
}
