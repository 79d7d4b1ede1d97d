//! Core data models used throughout the content generator.
//!
//! [`Idea`] and [`ContentPiece`] mirror the two stored record kinds. The
//! remaining types carry parsed backend output and aggregate counts between
//! the pipeline stages.

use serde::Serialize;

/// A stored topic idea.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Idea {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    pub content_generated: bool,
}

/// The generated article for one idea.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPiece {
    pub id: i64,
    pub idea_id: i64,
    pub title: String,
    /// Markdown article body.
    pub body: String,
    pub created_at: i64,
}

/// One topic suggestion parsed from the backend, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaCandidate {
    pub title: String,
    pub description: String,
}

impl IdeaCandidate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A generated article, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub body: String,
}

/// Outcome of asking whether a title duplicates one of a list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityVerdict {
    pub similar: bool,
    /// The existing title the candidate was matched against, when known.
    pub similar_to: Option<String>,
    pub reason: Option<String>,
}

impl SimilarityVerdict {
    pub fn distinct() -> Self {
        Self::default()
    }
}

/// Which ideas to include in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaFilter {
    All,
    Pending,
    Completed,
}

/// Aggregate store counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    pub total_ideas: i64,
    pub completed_ideas: i64,
    pub pending_ideas: i64,
    pub total_content: i64,
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ideas={} completed={} pending={} content={}",
            self.total_ideas, self.completed_ideas, self.pending_ideas, self.total_content
        )
    }
}
