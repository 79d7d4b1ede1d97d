//! Idea listing and single-idea retrieval for `cgen ideas` and `cgen show`.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::{ContentPiece, Idea, IdeaFilter};
use crate::stats::{format_ts_iso, format_ts_relative};
use crate::store::{IdeaStore, SqliteStore};

/// An idea together with its article, if one was written.
#[derive(Debug, Clone)]
pub struct IdeaDetail {
    pub idea: Idea,
    pub content: Option<ContentPiece>,
}

/// Fetch an idea and its content piece.
pub async fn get_idea_detail(store: &dyn IdeaStore, id: i64) -> Result<IdeaDetail> {
    let Some(idea) = store.get_idea(id).await? else {
        bail!("idea not found: {}", id);
    };
    let content = store.content_for_idea(id).await?;
    Ok(IdeaDetail { idea, content })
}

/// CLI entry point for `cgen ideas`.
pub async fn run_list(config: &Config, filter: IdeaFilter, limit: Option<usize>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let ideas = store.list_ideas(filter, limit).await?;
    store.close().await;

    if ideas.is_empty() {
        println!("No ideas found.");
        return Ok(());
    }

    println!("{:>5}  {:<9}  {:<14}  TITLE", "ID", "STATUS", "CREATED");
    println!("{}", "-".repeat(72));
    for idea in &ideas {
        println!(
            "{:>5}  {:<9}  {:<14}  {}",
            idea.id,
            if idea.content_generated { "done" } else { "pending" },
            format_ts_relative(idea.created_at),
            idea.title
        );
    }
    println!();
    println!("{} idea(s)", ideas.len());

    Ok(())
}

/// CLI entry point for `cgen show`.
pub async fn run_show(config: &Config, id: i64) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let detail = get_idea_detail(&store, id).await;
    store.close().await;

    let detail = match detail {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let idea = &detail.idea;
    println!("--- Idea ---");
    println!("id:          {}", idea.id);
    println!("title:       {}", idea.title);
    println!("created_at:  {}", format_ts_iso(idea.created_at));
    println!(
        "status:      {}",
        if idea.content_generated { "done" } else { "pending" }
    );
    if !idea.description.is_empty() {
        println!("description: {}", idea.description);
    }
    println!();

    match &detail.content {
        Some(piece) => {
            println!("--- Article #{} ({}) ---", piece.id, format_ts_iso(piece.created_at));
            println!("# {}", piece.title);
            println!();
            println!("{}", piece.body);
        }
        None => println!("(no article yet)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_detail_with_and_without_content() {
        let store = InMemoryStore::new();
        let a = store.insert_idea("Generics", "").await.unwrap().unwrap();
        let b = store.insert_idea("Macros", "").await.unwrap().unwrap();
        store
            .store_article(
                a,
                &Article {
                    title: "Generics in Practice".to_string(),
                    body: "...".to_string(),
                },
            )
            .await
            .unwrap();

        let detail = get_idea_detail(&store, a).await.unwrap();
        assert_eq!(detail.content.unwrap().title, "Generics in Practice");

        let detail = get_idea_detail(&store, b).await.unwrap();
        assert!(detail.content.is_none());

        assert!(get_idea_detail(&store, 999).await.is_err());
    }
}
