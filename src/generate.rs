//! Article generation for pending ideas.
//!
//! Reads a snapshot of pending ideas, asks the generator for one article per
//! idea and stores it. A backend failure only affects its own idea, which
//! stays pending for the next cycle.

use anyhow::Result;

use crate::generator::Generator;
use crate::models::IdeaFilter;
use crate::store::IdeaStore;

/// Totals for one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub pending: usize,
    pub generated: usize,
    pub failed: usize,
    /// Ideas that were completed by someone else between snapshot and store.
    pub skipped: usize,
    pub content_ids: Vec<i64>,
}

/// Generate and store articles for up to `limit` pending ideas (all when `None`).
pub async fn generate_pending(
    store: &dyn IdeaStore,
    generator: &dyn Generator,
    limit: Option<usize>,
    word_count: u32,
) -> Result<GenerationReport> {
    let pending = store.list_ideas(IdeaFilter::Pending, limit).await?;

    let mut report = GenerationReport {
        pending: pending.len(),
        ..Default::default()
    };

    if pending.is_empty() {
        tracing::info!("no pending ideas to generate content for");
        return Ok(report);
    }
    tracing::info!(count = pending.len(), "found pending ideas");

    for idea in &pending {
        let article = match generator
            .generate_article(&idea.title, &idea.description, word_count)
            .await
        {
            Ok(article) => article,
            Err(e) => {
                tracing::warn!(
                    id = idea.id,
                    topic = %idea.title,
                    kind = e.kind(),
                    error = %e,
                    "failed to generate content, leaving idea pending"
                );
                report.failed += 1;
                continue;
            }
        };

        match store.store_article(idea.id, &article).await? {
            Some(content_id) => {
                tracing::info!(content_id, idea_id = idea.id, title = %article.title, "stored content");
                report.generated += 1;
                report.content_ids.push(content_id);
            }
            None => {
                tracing::warn!(idea_id = idea.id, "idea no longer pending, discarding article");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        generated = report.generated,
        failed = report.failed,
        "content generation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorError;
    use crate::models::{Article, IdeaCandidate, SimilarityVerdict};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Writes a stub article, failing for titles listed in `fail_on`.
    struct ScriptedWriter {
        fail_on: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedWriter {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedWriter {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate_ideas(
            &self,
            _count: usize,
            _category: &str,
        ) -> Result<Vec<IdeaCandidate>, GeneratorError> {
            Ok(Vec::new())
        }

        async fn generate_article(
            &self,
            title: &str,
            _description: &str,
            word_count: u32,
        ) -> Result<Article, GeneratorError> {
            self.calls.lock().unwrap().push(title.to_string());
            if self.fail_on.iter().any(|f| *f == title) {
                return Err(GeneratorError::Api {
                    status: 503,
                    body: "overloaded".to_string(),
                });
            }
            Ok(Article {
                title: format!("Mastering {}", title),
                body: format!("# {}\n\n~{} words", title, word_count),
            })
        }

        async fn judge_similarity(
            &self,
            _candidate: &str,
            _existing: &[String],
        ) -> Result<SimilarityVerdict, GeneratorError> {
            Ok(SimilarityVerdict::distinct())
        }
    }

    #[tokio::test]
    async fn test_generates_one_piece_and_flips_flag() {
        let store = InMemoryStore::new();
        let id = store.insert_idea("Traits", "").await.unwrap().unwrap();
        let writer = ScriptedWriter::new(vec![]);

        let report = generate_pending(&store, &writer, None, 800).await.unwrap();
        assert_eq!(report.generated, 1);

        let idea = store.get_idea(id).await.unwrap().unwrap();
        assert!(idea.content_generated);
        let piece = store.content_for_idea(id).await.unwrap().unwrap();
        assert_eq!(piece.title, "Mastering Traits");
        assert!(piece.body.contains("~800 words"));
    }

    #[tokio::test]
    async fn test_second_pass_is_noop() {
        let store = InMemoryStore::new();
        store.insert_idea("Traits", "").await.unwrap();
        let writer = ScriptedWriter::new(vec![]);

        generate_pending(&store, &writer, None, 800).await.unwrap();
        let again = generate_pending(&store, &writer, None, 800).await.unwrap();

        assert_eq!(again.pending, 0);
        assert_eq!(writer.calls.lock().unwrap().len(), 1);
        assert_eq!(store.stats().await.unwrap().total_content, 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_later_ideas() {
        let store = InMemoryStore::new();
        let a = store.insert_idea("Alpha", "").await.unwrap().unwrap();
        let b = store.insert_idea("Beta", "").await.unwrap().unwrap();
        let writer = ScriptedWriter::new(vec!["Alpha"]);

        let report = generate_pending(&store, &writer, None, 800).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.generated, 1);

        assert!(!store.get_idea(a).await.unwrap().unwrap().content_generated);
        assert!(store.content_for_idea(a).await.unwrap().is_none());
        assert!(store.get_idea(b).await.unwrap().unwrap().content_generated);
        assert!(store.content_for_idea(b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_limit_takes_oldest_first() {
        let store = InMemoryStore::new();
        for t in ["one", "two", "three"] {
            store.insert_idea(t, "").await.unwrap();
        }
        let writer = ScriptedWriter::new(vec![]);

        let report = generate_pending(&store, &writer, Some(2), 800).await.unwrap();
        assert_eq!(report.generated, 2);
        assert_eq!(*writer.calls.lock().unwrap(), vec!["one", "two"]);
        assert_eq!(store.stats().await.unwrap().pending_ideas, 1);
    }
}
