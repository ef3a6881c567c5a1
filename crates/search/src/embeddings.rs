//! Embedder implementations: an HTTP-backed embedder calling an external
//! embedding deployment, a caching decorator around any `Embedder`, and a
//! deterministic hash-based embedder used in tests (spec.md §6).

use async_trait::async_trait;
use autolot_core::{Embedder, Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub key: Option<String>,
    pub deployment: Option<String>,
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { endpoint: String::new(), key: None, deployment: None, dimensions: 1536 }
    }
}

/// Calls an external embedding deployment over HTTP (spec.md §6: "the core
/// wraps it in a caching decorator" implies the raw embedder itself makes a
/// network call per request).
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }
}

#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(serde::Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest { input: text, model: self.config.deployment.as_deref() };
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::TransientDependency(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::TransientDependency(format!(
                "embedding deployment returned {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::PermanentDependency(format!("unparseable embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::PermanentDependency("embedding response carried no data".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "http-embedder"
    }
}

struct CacheEntry {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// Caches embeddings by exact text match with a TTL, avoiding a network
/// round-trip for repeated utterances within a session (spec.md §6).
pub struct CachingEmbedder {
    inner: Arc<dyn Embedder>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl CachingEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize, ttl: Duration) -> Self {
        Self { inner, entries: Mutex::new(HashMap::new()), capacity, ttl }
    }
}

#[async_trait]
impl Embedder for CachingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(entry) = self.entries.lock().get(text) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.vector.clone());
            }
        }

        let vector = self.inner.embed(text).await?;

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(text.to_string(), CacheEntry { vector: vector.clone(), inserted_at: Instant::now() });

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "caching-embedder"
    }
}

/// Deterministic hash-based embedder with no network dependency, used in
/// tests and as a local fallback.
pub struct SimpleEmbedder {
    dimensions: usize,
}

impl SimpleEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % self.dimensions;
            embedding[idx] += 1.0;
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "simple-embedder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simple_embedder_produces_unit_vector() {
        let embedder = SimpleEmbedder::new(384);
        let embedding = embedder.embed("BMW under 20000").await.unwrap();
        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn caching_embedder_returns_same_vector_without_recomputing() {
        let inner = Arc::new(SimpleEmbedder::new(16));
        let cache = CachingEmbedder::new(inner, 10, Duration::from_secs(60));
        let a = cache.embed("reliable family car").await.unwrap();
        let b = cache.embed("reliable family car").await.unwrap();
        assert_eq!(a, b);
    }
}
