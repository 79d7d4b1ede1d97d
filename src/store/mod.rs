//! Storage abstraction for ideas and content pieces.
//!
//! The [`IdeaStore`] trait is the only way the pipeline touches
//! persistence, so cycles can run against SQLite in production and against
//! [`InMemoryStore`] in tests.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`insert_idea`](IdeaStore::insert_idea) | Insert a new pending idea, `None` if the title exists |
//! | [`idea_exists`](IdeaStore::idea_exists) | Exact, case-sensitive title lookup |
//! | [`get_idea`](IdeaStore::get_idea) | Fetch one idea by id |
//! | [`list_ideas`](IdeaStore::list_ideas) | List ideas, optionally only pending or completed |
//! | [`recent_titles`](IdeaStore::recent_titles) | Newest-first titles for similarity checks |
//! | [`mark_completed`](IdeaStore::mark_completed) | Flip the content flag once |
//! | [`insert_content`](IdeaStore::insert_content) | Store a content piece |
//! | [`store_article`](IdeaStore::store_article) | Insert content and flip the flag atomically |
//! | [`content_for_idea`](IdeaStore::content_for_idea) | Fetch the article written for an idea |
//! | [`stats`](IdeaStore::stats) | Aggregate counts |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Article, ContentPiece, Idea, IdeaFilter, Stats};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Insert a pending idea.
    ///
    /// Returns the new id, or `None` when an idea with the same title is
    /// already stored. A duplicate title is an expected outcome, not an error.
    async fn insert_idea(&self, title: &str, description: &str) -> Result<Option<i64>>;

    async fn idea_exists(&self, title: &str) -> Result<bool>;

    async fn get_idea(&self, id: i64) -> Result<Option<Idea>>;

    /// Pending and completed listings are oldest first; `All` is newest first.
    async fn list_ideas(&self, filter: IdeaFilter, limit: Option<usize>) -> Result<Vec<Idea>>;

    /// Titles of the most recently created ideas, newest first.
    async fn recent_titles(&self, limit: Option<usize>) -> Result<Vec<String>>;

    /// Returns `true` only if the flag went from false to true.
    async fn mark_completed(&self, id: i64) -> Result<bool>;

    async fn insert_content(&self, idea_id: i64, title: &str, body: &str) -> Result<i64>;

    /// Store `article` for a pending idea and mark it completed as one unit.
    ///
    /// Returns `None` without writing anything when the idea is missing or
    /// already completed.
    async fn store_article(&self, idea_id: i64, article: &Article) -> Result<Option<i64>>;

    async fn content_for_idea(&self, idea_id: i64) -> Result<Option<ContentPiece>>;

    async fn stats(&self) -> Result<Stats>;
}
