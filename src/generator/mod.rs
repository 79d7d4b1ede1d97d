//! Text-generation backend abstraction.
//!
//! The [`Generator`] trait exposes the three calls the pipeline makes:
//! inventing idea candidates, writing an article, and judging whether a
//! title duplicates one of a list. [`OpenAiGenerator`] implements it against
//! any OpenAI-compatible chat completions endpoint; tests substitute fakes.
//!
//! All calls return [`GeneratorError`] so callers can log the failure class
//! (transport, rate limit, API status, malformed output) before deciding
//! whether to skip the item or fail open.

pub mod openai;
pub mod parse;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Article, IdeaCandidate, SimilarityVerdict};

pub use openai::OpenAiGenerator;

/// Failure modes of a backend call.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("{0} environment variable not set")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("model returned an empty response")]
    EmptyResponse,
}

impl GeneratorError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        GeneratorError::Malformed(msg.into())
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorError::MissingApiKey(_) => "missing_api_key",
            GeneratorError::Transport(_) => "transport",
            GeneratorError::RateLimited(_) => "rate_limited",
            GeneratorError::Api { .. } => "api",
            GeneratorError::Malformed(_) => "malformed",
            GeneratorError::EmptyResponse => "empty_response",
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier sent with every request.
    fn model_name(&self) -> &str;

    /// Ask for up to `count` topic ideas within `category`.
    async fn generate_ideas(
        &self,
        count: usize,
        category: &str,
    ) -> Result<Vec<IdeaCandidate>, GeneratorError>;

    /// Write one markdown article of roughly `word_count` words.
    async fn generate_article(
        &self,
        title: &str,
        description: &str,
        word_count: u32,
    ) -> Result<Article, GeneratorError>;

    /// Decide whether `candidate` substantially overlaps any of `existing`.
    async fn judge_similarity(
        &self,
        candidate: &str,
        existing: &[String],
    ) -> Result<SimilarityVerdict, GeneratorError>;
}
