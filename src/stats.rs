//! Database statistics overview.
//!
//! Used by `cgen stats` to show how many ideas are stored, how many already
//! have an article, and how large the database file has grown.

use anyhow::Result;

use crate::config::Config;
use crate::models::{IdeaFilter, Stats};
use crate::store::{IdeaStore, SqliteStore};

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let stats = store.stats().await?;
    let latest = store.list_ideas(IdeaFilter::All, Some(1)).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Content Generator: Database Stats");
    println!("=================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    print_counts(&stats);

    if let Some(idea) = latest.first() {
        println!();
        println!(
            "  Latest idea: {} ({})",
            idea.title,
            format_ts_relative(idea.created_at)
        );
    }

    println!();

    store.close().await;
    Ok(())
}

fn print_counts(stats: &Stats) {
    println!("  Ideas:       {}", stats.total_ideas);
    println!(
        "  Completed:   {} / {} ({}%)",
        stats.completed_ideas,
        stats.total_ideas,
        if stats.total_ideas > 0 {
            (stats.completed_ideas * 100) / stats.total_ideas
        } else {
            0
        }
    );
    println!("  Pending:     {}", stats.pending_ideas);
    println!("  Articles:    {}", stats.total_content);
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
pub fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_relative_time() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 60), "1 min ago");
        assert_eq!(format_ts_relative(now - 2 * 3600), "2 hours ago");
        assert_eq!(format_ts_relative(now - 3 * 86400), "3 days ago");
    }

    #[test]
    fn test_iso_fallback() {
        assert_eq!(format_ts_iso(0), "1970-01-01 00:00");
    }
}
