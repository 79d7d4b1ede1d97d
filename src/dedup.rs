//! Semantic duplicate detection.
//!
//! A [`SimilarityJudge`] decides whether a candidate title overlaps any
//! title in a list. Two strategies are available, selected by
//! `[dedup] strategy`:
//!
//! | Strategy | Judge | How |
//! |----------|-------|-----|
//! | `model` | [`ModelJudge`] | asks the chat backend in one request |
//! | `embedding` | [`EmbeddingJudge`] | cosine similarity of title embeddings |
//!
//! Both follow the same contract: an `Err` means "could not decide", and
//! the ingestion step treats that as not-a-duplicate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::embedding::{cosine_similarity, Embedder, OpenAiEmbedder};
use crate::generator::{Generator, GeneratorError};
use crate::models::SimilarityVerdict;

/// Build the judge named by `dedup.strategy`.
pub fn create_judge(
    config: &Config,
    generator: Arc<dyn Generator>,
) -> Result<Arc<dyn SimilarityJudge>> {
    match config.dedup.strategy.as_str() {
        "model" => Ok(Arc::new(ModelJudge::new(generator))),
        "embedding" => {
            let embedder = OpenAiEmbedder::new(&config.generator, &config.dedup)?;
            Ok(Arc::new(EmbeddingJudge::new(
                Box::new(embedder),
                config.dedup.threshold,
            )))
        }
        other => bail!("Unknown dedup strategy: {}", other),
    }
}

#[async_trait]
pub trait SimilarityJudge: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &str;

    async fn judge(
        &self,
        candidate: &str,
        existing: &[String],
    ) -> Result<SimilarityVerdict, GeneratorError>;
}

/// Delegates the decision to [`Generator::judge_similarity`].
pub struct ModelJudge {
    generator: Arc<dyn Generator>,
}

impl ModelJudge {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl SimilarityJudge for ModelJudge {
    fn name(&self) -> &str {
        "model"
    }

    async fn judge(
        &self,
        candidate: &str,
        existing: &[String],
    ) -> Result<SimilarityVerdict, GeneratorError> {
        if existing.is_empty() {
            return Ok(SimilarityVerdict::distinct());
        }
        self.generator.judge_similarity(candidate, existing).await
    }
}

/// Nearest-neighbour check over title embeddings.
///
/// Vectors are cached per title for the life of the judge, so each title
/// is embedded at most once per process.
pub struct EmbeddingJudge {
    embedder: Box<dyn Embedder>,
    threshold: f32,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl EmbeddingJudge {
    pub fn new(embedder: Box<dyn Embedder>, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn ensure_cached(&self, titles: Vec<&str>) -> Result<(), GeneratorError> {
        let missing: Vec<String> = {
            let cache = self.cache.lock().unwrap();
            let mut missing: Vec<String> = Vec::new();
            for title in titles {
                if !cache.contains_key(title) && !missing.iter().any(|m| m == title) {
                    missing.push(title.to_string());
                }
            }
            missing
        };

        if missing.is_empty() {
            return Ok(());
        }

        let vectors = self.embedder.embed(&missing).await?;
        let mut cache = self.cache.lock().unwrap();
        for (title, vec) in missing.into_iter().zip(vectors) {
            cache.insert(title, vec);
        }
        Ok(())
    }
}

#[async_trait]
impl SimilarityJudge for EmbeddingJudge {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn judge(
        &self,
        candidate: &str,
        existing: &[String],
    ) -> Result<SimilarityVerdict, GeneratorError> {
        if existing.is_empty() {
            return Ok(SimilarityVerdict::distinct());
        }

        let mut titles: Vec<&str> = Vec::with_capacity(existing.len() + 1);
        titles.push(candidate);
        titles.extend(existing.iter().map(String::as_str));
        self.ensure_cached(titles).await?;

        let cache = self.cache.lock().unwrap();
        let target = cache
            .get(candidate)
            .ok_or_else(|| GeneratorError::malformed("candidate embedding missing"))?;

        let best = existing
            .iter()
            .filter_map(|title| {
                cache
                    .get(title)
                    .map(|vec| (title, cosine_similarity(target, vec)))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let verdict = match best {
            Some((title, score)) if score >= self.threshold => SimilarityVerdict {
                similar: true,
                similar_to: Some(title.clone()),
                reason: Some(format!("cosine similarity {:.3}", score)),
            },
            Some((_, score)) => SimilarityVerdict {
                similar: false,
                similar_to: None,
                reason: Some(format!("best cosine similarity {:.3}", score)),
            },
            None => SimilarityVerdict::distinct(),
        };
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps a few known titles to fixed 2-d vectors.
    struct TableEmbedder {
        calls: AtomicUsize,
        embedded: AtomicUsize,
    }

    impl TableEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                embedded: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for Arc<TableEmbedder> {
        fn model_name(&self) -> &str {
            "table"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("Recursion") {
                        vec![1.0, 0.05]
                    } else if t.contains("Hash") {
                        vec![0.7, -0.7]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError> {
            Err(GeneratorError::RateLimited("slow down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_embedding_judge_flags_nearest_title() {
        let embedder = Arc::new(TableEmbedder::new());
        let judge = EmbeddingJudge::new(Box::new(embedder.clone()), 0.9);
        let existing = vec!["Big-O Basics".to_string(), "Intro to Recursion".to_string()];

        let verdict = judge
            .judge("Recursion for Beginners", &existing)
            .await
            .unwrap();
        assert!(verdict.similar);
        assert_eq!(verdict.similar_to.as_deref(), Some("Intro to Recursion"));

        let verdict = judge.judge("Hash Maps", &existing).await.unwrap();
        assert!(!verdict.similar);

        // Existing titles were embedded once and then served from cache.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(embedder.embedded.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_embedding_judge_empty_list_skips_backend() {
        let judge = EmbeddingJudge::new(Box::new(FailingEmbedder), 0.9);
        let verdict = judge.judge("Anything", &[]).await.unwrap();
        assert!(!verdict.similar);
    }

    #[tokio::test]
    async fn test_embedding_judge_propagates_backend_error() {
        let judge = EmbeddingJudge::new(Box::new(FailingEmbedder), 0.9);
        let existing = vec!["Intro to Recursion".to_string()];
        assert!(judge.judge("Recursion 101", &existing).await.is_err());
    }
}
