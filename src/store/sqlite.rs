//! SQLite-backed [`IdeaStore`] implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::models::{Article, ContentPiece, Idea, IdeaFilter, Stats};
use crate::{db, migrate};

use super::IdeaStore;

/// Wraps a [`SqlitePool`] opened on the `ideas` / `content` schema created
/// by [`crate::migrate`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config)
            .await
            .with_context(|| format!("Failed to open database: {}", config.db.path.display()))?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// SQLite treats a negative LIMIT as unbounded.
fn limit_param(limit: Option<usize>) -> i64 {
    limit.map(|l| l as i64).unwrap_or(-1)
}

fn idea_from_row(row: &SqliteRow) -> Idea {
    Idea {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        content_generated: row.get("content_generated"),
    }
}

#[async_trait]
impl IdeaStore for SqliteStore {
    async fn insert_idea(&self, title: &str, description: &str) -> Result<Option<i64>> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO ideas (title, description, created_at, content_generated)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(title) DO NOTHING
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    async fn idea_exists(&self, title: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM ideas WHERE title = ?")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn get_idea(&self, id: i64) -> Result<Option<Idea>> {
        let row = sqlx::query(
            "SELECT id, title, description, created_at, content_generated FROM ideas WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(idea_from_row))
    }

    async fn list_ideas(&self, filter: IdeaFilter, limit: Option<usize>) -> Result<Vec<Idea>> {
        let sql = match filter {
            IdeaFilter::All => {
                r#"
                SELECT id, title, description, created_at, content_generated
                FROM ideas
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#
            }
            IdeaFilter::Pending => {
                r#"
                SELECT id, title, description, created_at, content_generated
                FROM ideas
                WHERE content_generated = 0
                ORDER BY created_at ASC, id ASC
                LIMIT ?
                "#
            }
            IdeaFilter::Completed => {
                r#"
                SELECT id, title, description, created_at, content_generated
                FROM ideas
                WHERE content_generated = 1
                ORDER BY created_at ASC, id ASC
                LIMIT ?
                "#
            }
        };

        let rows = sqlx::query(sql)
            .bind(limit_param(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(idea_from_row).collect())
    }

    async fn recent_titles(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let titles: Vec<String> =
            sqlx::query_scalar("SELECT title FROM ideas ORDER BY created_at DESC, id DESC LIMIT ?")
                .bind(limit_param(limit))
                .fetch_all(&self.pool)
                .await?;
        Ok(titles)
    }

    async fn mark_completed(&self, id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE ideas SET content_generated = 1 WHERE id = ? AND content_generated = 0")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_content(&self, idea_id: i64, title: &str, body: &str) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let result =
            sqlx::query("INSERT INTO content (idea_id, title, body, created_at) VALUES (?, ?, ?, ?)")
                .bind(idea_id)
                .bind(title)
                .bind(body)
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    async fn store_article(&self, idea_id: i64, article: &Article) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        // Claim the idea first so a completed idea never gets a second piece.
        let claimed =
            sqlx::query("UPDATE ideas SET content_generated = 1 WHERE id = ? AND content_generated = 0")
                .bind(idea_id)
                .execute(&mut *tx)
                .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();
        let inserted =
            sqlx::query("INSERT INTO content (idea_id, title, body, created_at) VALUES (?, ?, ?, ?)")
                .bind(idea_id)
                .bind(&article.title)
                .bind(&article.body)
                .bind(now)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some(inserted.last_insert_rowid()))
    }

    async fn content_for_idea(&self, idea_id: i64) -> Result<Option<ContentPiece>> {
        let row = sqlx::query(
            r#"
            SELECT id, idea_id, title, body, created_at
            FROM content
            WHERE idea_id = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(idea_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ContentPiece {
            id: row.get("id"),
            idea_id: row.get("idea_id"),
            title: row.get("title"),
            body: row.get("body"),
            created_at: row.get("created_at"),
        }))
    }

    async fn stats(&self) -> Result<Stats> {
        let total_ideas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ideas")
            .fetch_one(&self.pool)
            .await?;

        let completed_ideas: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ideas WHERE content_generated = 1")
                .fetch_one(&self.pool)
                .await?;

        let total_content: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content")
            .fetch_one(&self.pool)
            .await?;

        Ok(Stats {
            total_ideas,
            completed_ideas,
            pending_ideas: total_ideas - completed_ideas,
            total_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::migrate;
    use tempfile::TempDir;

    async fn open_store(tmp: &TempDir) -> SqliteStore {
        let pool = db::connect_path(&tmp.path().join("ideas.sqlite"))
            .await
            .unwrap();
        migrate::migrate_pool(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            body: "# Heading\n\nBody text.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_title_returns_none() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let first = store.insert_idea("Intro to Recursion", "a").await.unwrap();
        let second = store.insert_idea("Intro to Recursion", "b").await.unwrap();
        assert!(first.is_some());
        assert_eq!(second, None);
        assert_eq!(store.stats().await.unwrap().total_ideas, 1);
    }

    #[tokio::test]
    async fn test_exists_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store.insert_idea("Rust Lifetimes", "").await.unwrap();
        assert!(store.idea_exists("Rust Lifetimes").await.unwrap());
        assert!(!store.idea_exists("rust lifetimes").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_article_flips_flag_once() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let id = store.insert_idea("Async Rust", "").await.unwrap().unwrap();
        let first = store.store_article(id, &article("Async Rust")).await.unwrap();
        let second = store.store_article(id, &article("Again")).await.unwrap();

        assert!(first.is_some());
        assert_eq!(second, None);

        let idea = store.get_idea(id).await.unwrap().unwrap();
        assert!(idea.content_generated);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_content, 1);
        assert_eq!(stats.completed_ideas, 1);
        assert_eq!(stats.pending_ideas, 0);

        let piece = store.content_for_idea(id).await.unwrap().unwrap();
        assert_eq!(piece.title, "Async Rust");
    }

    #[tokio::test]
    async fn test_store_article_for_missing_idea() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        assert_eq!(store.store_article(42, &article("x")).await.unwrap(), None);
        assert_eq!(store.stats().await.unwrap().total_content, 0);
    }

    #[tokio::test]
    async fn test_pending_listing_is_oldest_first() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let a = store.insert_idea("A", "").await.unwrap().unwrap();
        let b = store.insert_idea("B", "").await.unwrap().unwrap();
        let c = store.insert_idea("C", "").await.unwrap().unwrap();
        assert!(store.mark_completed(b).await.unwrap());
        assert!(!store.mark_completed(b).await.unwrap());

        let pending = store.list_ideas(IdeaFilter::Pending, None).await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, c]);

        let capped = store.list_ideas(IdeaFilter::Pending, Some(1)).await.unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, a);

        let done = store.list_ideas(IdeaFilter::Completed, None).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "B");
    }

    #[tokio::test]
    async fn test_recent_titles_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        for title in ["one", "two", "three"] {
            store.insert_idea(title, "").await.unwrap();
        }
        let all = store.recent_titles(None).await.unwrap();
        assert_eq!(all, vec!["three", "two", "one"]);
        let two = store.recent_titles(Some(2)).await.unwrap();
        assert_eq!(two, vec!["three", "two"]);
    }
}
