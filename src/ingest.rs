//! Idea ingestion: decide which generated candidates become stored ideas.
//!
//! Each candidate, in order, goes through:
//!
//! 1. an exact, case-sensitive title lookup in the store;
//! 2. a semantic check against recent titles via a [`SimilarityJudge`];
//! 3. insertion as a pending idea.
//!
//! Titles accepted earlier in the same batch join the comparison set.
//! A judge failure is logged and the candidate is accepted (fail-open).
//! Storage errors abort the batch and propagate.

use anyhow::Result;

use crate::dedup::SimilarityJudge;
use crate::models::IdeaCandidate;
use crate::store::IdeaStore;

/// What happened to a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted { id: i64 },
    ExactDuplicate,
    SemanticDuplicate { similar_to: Option<String> },
    EmptyTitle,
}

/// Per-candidate outcomes and totals for one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub outcomes: Vec<(String, IngestOutcome)>,
    pub inserted: usize,
    pub exact_duplicates: usize,
    pub semantic_duplicates: usize,
    pub skipped: usize,
    /// Similarity checks that failed and were treated as "not a duplicate".
    pub judge_failures: usize,
}

impl IngestReport {
    fn record(&mut self, title: &str, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Inserted { .. } => self.inserted += 1,
            IngestOutcome::ExactDuplicate => self.exact_duplicates += 1,
            IngestOutcome::SemanticDuplicate { .. } => self.semantic_duplicates += 1,
            IngestOutcome::EmptyTitle => self.skipped += 1,
        }
        self.outcomes.push((title.to_string(), outcome));
    }

    pub fn duplicates(&self) -> usize {
        self.exact_duplicates + self.semantic_duplicates
    }
}

/// Run the dedup-and-insert decision over a batch of candidates.
///
/// `window` caps the stored titles compared against to the most recent
/// `window`; `None` compares against every stored title.
pub async fn ingest_candidates(
    store: &dyn IdeaStore,
    judge: &dyn SimilarityJudge,
    candidates: &[IdeaCandidate],
    window: Option<usize>,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    if candidates.is_empty() {
        return Ok(report);
    }

    let mut known_titles = store.recent_titles(window).await?;

    for candidate in candidates {
        let title = candidate.title.trim();
        let description = candidate.description.trim();

        if title.is_empty() {
            tracing::warn!("skipping idea with empty topic");
            report.record(title, IngestOutcome::EmptyTitle);
            continue;
        }

        if store.idea_exists(title).await? {
            tracing::info!(topic = title, "duplicate topic (exact match)");
            report.record(title, IngestOutcome::ExactDuplicate);
            continue;
        }

        match judge.judge(title, &known_titles).await {
            Ok(verdict) if verdict.similar => {
                tracing::info!(
                    topic = title,
                    similar_to = verdict.similar_to.as_deref().unwrap_or("?"),
                    reason = verdict.reason.as_deref().unwrap_or(""),
                    "duplicate topic (similar)"
                );
                report.record(
                    title,
                    IngestOutcome::SemanticDuplicate {
                        similar_to: verdict.similar_to,
                    },
                );
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    topic = title,
                    judge = judge.name(),
                    kind = e.kind(),
                    error = %e,
                    "similarity check failed, accepting topic"
                );
                report.judge_failures += 1;
            }
        }

        match store.insert_idea(title, description).await? {
            Some(id) => {
                tracing::info!(id, topic = title, "added new idea");
                known_titles.push(title.to_string());
                report.record(title, IngestOutcome::Inserted { id });
            }
            None => {
                tracing::info!(topic = title, "duplicate topic (already stored)");
                report.record(title, IngestOutcome::ExactDuplicate);
            }
        }
    }

    tracing::info!(
        new = report.inserted,
        duplicates = report.duplicates(),
        judge_failures = report.judge_failures,
        "idea ingestion complete"
    );
    Ok(report)
}
