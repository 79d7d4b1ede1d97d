//! In-memory [`IdeaStore`] implementation for tests and dry runs.
//!
//! Keeps both record kinds in `Vec`s behind one `std::sync::RwLock`, so the
//! insert-and-flag step of [`store_article`](IdeaStore::store_article) is
//! atomic for the same reason the SQLite transaction is.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Article, ContentPiece, Idea, IdeaFilter, Stats};

use super::IdeaStore;

#[derive(Default)]
struct Tables {
    ideas: Vec<Idea>,
    content: Vec<ContentPiece>,
    next_idea_id: i64,
    next_content_id: i64,
}

impl Tables {
    fn push_content(&mut self, idea_id: i64, title: &str, body: &str) -> i64 {
        self.next_content_id += 1;
        let id = self.next_content_id;
        self.content.push(ContentPiece {
            id,
            idea_id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        });
        id
    }

    fn pending_idea_mut(&mut self, id: i64) -> Option<&mut Idea> {
        self.ideas
            .iter_mut()
            .find(|i| i.id == id && !i.content_generated)
    }
}

/// In-memory store with SQLite-compatible semantics.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdeaStore for InMemoryStore {
    async fn insert_idea(&self, title: &str, description: &str) -> Result<Option<i64>> {
        let mut tables = self.tables.write().unwrap();
        if tables.ideas.iter().any(|i| i.title == title) {
            return Ok(None);
        }
        tables.next_idea_id += 1;
        let id = tables.next_idea_id;
        tables.ideas.push(Idea {
            id,
            title: title.to_string(),
            description: description.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            content_generated: false,
        });
        Ok(Some(id))
    }

    async fn idea_exists(&self, title: &str) -> Result<bool> {
        let tables = self.tables.read().unwrap();
        Ok(tables.ideas.iter().any(|i| i.title == title))
    }

    async fn get_idea(&self, id: i64) -> Result<Option<Idea>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.ideas.iter().find(|i| i.id == id).cloned())
    }

    async fn list_ideas(&self, filter: IdeaFilter, limit: Option<usize>) -> Result<Vec<Idea>> {
        let tables = self.tables.read().unwrap();
        let limit = limit.unwrap_or(usize::MAX);

        // Ideas are kept in insertion (id) order, which is creation order.
        let ideas: Vec<Idea> = match filter {
            IdeaFilter::All => tables.ideas.iter().rev().take(limit).cloned().collect(),
            IdeaFilter::Pending => tables
                .ideas
                .iter()
                .filter(|i| !i.content_generated)
                .take(limit)
                .cloned()
                .collect(),
            IdeaFilter::Completed => tables
                .ideas
                .iter()
                .filter(|i| i.content_generated)
                .take(limit)
                .cloned()
                .collect(),
        };
        Ok(ideas)
    }

    async fn recent_titles(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .ideas
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|i| i.title.clone())
            .collect())
    }

    async fn mark_completed(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().unwrap();
        match tables.pending_idea_mut(id) {
            Some(idea) => {
                idea.content_generated = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_content(&self, idea_id: i64, title: &str, body: &str) -> Result<i64> {
        let mut tables = self.tables.write().unwrap();
        if !tables.ideas.iter().any(|i| i.id == idea_id) {
            anyhow::bail!("FOREIGN KEY constraint failed: no idea with id {}", idea_id);
        }
        Ok(tables.push_content(idea_id, title, body))
    }

    async fn store_article(&self, idea_id: i64, article: &Article) -> Result<Option<i64>> {
        let mut tables = self.tables.write().unwrap();
        match tables.pending_idea_mut(idea_id) {
            Some(idea) => idea.content_generated = true,
            None => return Ok(None),
        }
        Ok(Some(tables.push_content(
            idea_id,
            &article.title,
            &article.body,
        )))
    }

    async fn content_for_idea(&self, idea_id: i64) -> Result<Option<ContentPiece>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .content
            .iter()
            .find(|c| c.idea_id == idea_id)
            .cloned())
    }

    async fn stats(&self) -> Result<Stats> {
        let tables = self.tables.read().unwrap();
        let total_ideas = tables.ideas.len() as i64;
        let completed_ideas = tables.ideas.iter().filter(|i| i.content_generated).count() as i64;
        Ok(Stats {
            total_ideas,
            completed_ideas,
            pending_ideas: total_ideas - completed_ideas,
            total_content: tables.content.len() as i64,
        })
    }
}
