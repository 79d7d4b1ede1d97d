//! Embedding provider used by the vector-based similarity judge.
//!
//! Defines the [`Embedder`] trait and [`OpenAiEmbedder`], which calls the
//! OpenAI-compatible `POST {base_url}/embeddings` endpoint with the same
//! retry/backoff policy as chat requests. Also provides
//! [`cosine_similarity`] for comparing the returned vectors.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{DedupConfig, GeneratorConfig};
use crate::generator::openai::{api_key_from_env, post_json_with_retry};
use crate::generator::GeneratorError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError>;
}

/// Embedding provider using the OpenAI embeddings API.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OpenAiEmbedder {
    /// Shares the API key, base URL and retry settings of the chat backend.
    pub fn new(generator: &GeneratorConfig, dedup: &DedupConfig) -> Result<Self, GeneratorError> {
        let api_key = api_key_from_env(&generator.api_key_env)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(generator.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: generator.base_url.trim_end_matches('/').to_string(),
            model: dedup.embedding_model.clone(),
            max_retries: generator.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let json = post_json_with_retry(
            &self.client,
            &format!("{}/embeddings", self.base_url),
            &self.api_key,
            &body,
            self.max_retries,
        )
        .await?;

        let vectors = parse_embeddings_response(&json)?;
        if vectors.len() != texts.len() {
            return Err(GeneratorError::malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// Parse the embeddings API response JSON.
///
/// Extracts the `data[].embedding` arrays, ordered by `data[].index` when
/// present.
pub fn parse_embeddings_response(json: &Value) -> Result<Vec<Vec<f32>>, GeneratorError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| GeneratorError::malformed("embeddings response is missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| GeneratorError::malformed("embeddings response is missing embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors or vectors
/// of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_parse_orders_by_index() {
        let resp = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vecs = parse_embeddings_response(&resp).unwrap();
        assert_eq!(vecs, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_rejects_missing_data() {
        assert!(parse_embeddings_response(&json!({"object": "list"})).is_err());
        assert!(parse_embeddings_response(&json!({"data": [{"index": 0}]})).is_err());
    }
}
