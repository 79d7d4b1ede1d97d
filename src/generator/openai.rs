//! OpenAI-compatible chat completions backend.
//!
//! Calls `POST {base_url}/chat/completions` with a system and a user
//! message and `response_format = json_object`, then hands the reply text
//! to [`super::parse`].
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::{parse, prompts, Generator, GeneratorError};
use crate::config::GeneratorConfig;
use crate::models::{Article, IdeaCandidate, SimilarityVerdict};

/// Read the API key from the environment variable named in config.
pub fn api_key_from_env(var: &str) -> Result<String, GeneratorError> {
    std::env::var(var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| GeneratorError::MissingApiKey(var.to_string()))
}

/// POST `body` as JSON with bearer auth, retrying transient failures.
pub(crate) async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Value,
    max_retries: u32,
) -> Result<Value, GeneratorError> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(attempt, ?delay, url, "retrying backend request");
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|e| GeneratorError::malformed(format!("response body: {}", e)));
                }

                let body_text = response.text().await.unwrap_or_default();

                // Rate limited or server error: retry
                if status.as_u16() == 429 {
                    last_err = Some(GeneratorError::RateLimited(body_text));
                    continue;
                }
                if status.is_server_error() {
                    last_err = Some(GeneratorError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    });
                    continue;
                }

                // Client error (not 429): fail now
                return Err(GeneratorError::Api {
                    status: status.as_u16(),
                    body: body_text,
                });
            }
            Err(e) => {
                last_err = Some(GeneratorError::Transport(e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| GeneratorError::malformed("request failed after retries")))
}

/// Chat completions client for idea, article and similarity requests.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the API key variable named by `api_key_env` is unset.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = api_key_from_env(&config.api_key_env)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn chat(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GeneratorError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": temperature,
            "response_format": {"type": "json_object"},
        });

        let json = post_json_with_retry(
            &self.client,
            &self.endpoint(),
            &self.api_key,
            &body,
            self.config.max_retries,
        )
        .await?;

        parse::completion_text(&json)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate_ideas(
        &self,
        count: usize,
        category: &str,
    ) -> Result<Vec<IdeaCandidate>, GeneratorError> {
        tracing::info!(count, category, "requesting topic ideas");
        let reply = self
            .chat(
                prompts::IDEAS_SYSTEM,
                &prompts::ideas_prompt(count, category),
                self.config.ideas_temperature,
            )
            .await?;

        let ideas = parse::parse_ideas(&reply, count)?;
        tracing::info!(received = ideas.len(), "parsed topic ideas");
        Ok(ideas)
    }

    async fn generate_article(
        &self,
        title: &str,
        description: &str,
        word_count: u32,
    ) -> Result<Article, GeneratorError> {
        tracing::info!(topic = title, word_count, "requesting article");
        let reply = self
            .chat(
                prompts::ARTICLE_SYSTEM,
                &prompts::article_prompt(title, description, word_count),
                self.config.article_temperature,
            )
            .await?;

        parse::parse_article(&reply)
    }

    async fn judge_similarity(
        &self,
        candidate: &str,
        existing: &[String],
    ) -> Result<SimilarityVerdict, GeneratorError> {
        if existing.is_empty() {
            return Ok(SimilarityVerdict::distinct());
        }

        tracing::debug!(topic = candidate, compared = existing.len(), "checking similarity");
        let reply = self
            .chat(
                prompts::SIMILARITY_SYSTEM,
                &prompts::similarity_prompt(candidate, existing),
                self.config.similarity_temperature,
            )
            .await?;

        parse::parse_similarity(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reported_by_name() {
        let err = api_key_from_env("CGEN_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, GeneratorError::MissingApiKey(_)));
        assert_eq!(
            err.to_string(),
            "CGEN_TEST_KEY_THAT_IS_NEVER_SET environment variable not set"
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let gen = OpenAiGenerator {
            client: reqwest::Client::new(),
            api_key: "k".to_string(),
            config: GeneratorConfig {
                base_url: "http://localhost:8080/v1/".to_string(),
                ..GeneratorConfig::default()
            },
        };
        assert_eq!(gen.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(gen.model_name(), "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_empty_comparison_set_skips_request() {
        let gen = OpenAiGenerator {
            client: reqwest::Client::new(),
            api_key: "k".to_string(),
            // Unroutable: any request would fail.
            config: GeneratorConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                max_retries: 0,
                ..GeneratorConfig::default()
            },
        };
        let verdict = gen.judge_similarity("Anything", &[]).await.unwrap();
        assert!(!verdict.similar);
    }
}
