//! TOML configuration.
//!
//! Every section and field is optional; a missing file falls back to
//! [`Config::minimal`]. CLI flags applied in `main` take precedence over
//! anything read here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("content_generator.db")
}

/// Settings for the OpenAI-compatible chat completions backend.
#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_ideas_temperature")]
    pub ideas_temperature: f32,
    #[serde(default = "default_article_temperature")]
    pub article_temperature: f32,
    #[serde(default = "default_similarity_temperature")]
    pub similarity_temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            ideas_temperature: default_ideas_temperature(),
            article_temperature: default_article_temperature(),
            similarity_temperature: default_similarity_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_ideas_temperature() -> f32 {
    0.8
}
fn default_article_temperature() -> f32 {
    0.7
}
fn default_similarity_temperature() -> f32 {
    0.3
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_ideas_per_run")]
    pub ideas_per_run: usize,
    /// Cap on articles written per cycle. `0` processes every pending idea.
    #[serde(default = "default_content_per_run")]
    pub content_per_run: usize,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    /// Compare candidates against at most this many recent titles.
    #[serde(default)]
    pub similarity_window: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ideas_per_run: default_ideas_per_run(),
            content_per_run: default_content_per_run(),
            category: default_category(),
            word_count: default_word_count(),
            similarity_window: None,
        }
    }
}

fn default_ideas_per_run() -> usize {
    5
}
fn default_content_per_run() -> usize {
    3
}
fn default_category() -> String {
    "programming".to_string()
}
fn default_word_count() -> u32 {
    800
}

#[derive(Debug, Deserialize, Clone)]
pub struct DedupConfig {
    /// `model` asks the chat backend, `embedding` compares title vectors.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            embedding_model: default_embedding_model(),
            threshold: default_threshold(),
        }
    }
}

fn default_strategy() -> String {
    "model".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_threshold() -> f32 {
    0.85
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

fn default_interval_minutes() -> u64 {
    60
}

/// Longest accepted schedule interval (one week).
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Check the invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.ideas_per_run == 0 {
            anyhow::bail!("pipeline.ideas_per_run must be > 0");
        }
        if self.pipeline.word_count == 0 {
            anyhow::bail!("pipeline.word_count must be > 0");
        }
        if self.schedule.interval_minutes == 0 {
            anyhow::bail!("schedule.interval_minutes must be > 0");
        }
        if self.schedule.interval_minutes > MAX_INTERVAL_MINUTES {
            anyhow::bail!(
                "schedule.interval_minutes must be <= {} (one week)",
                MAX_INTERVAL_MINUTES
            );
        }
        if self.generator.model.trim().is_empty() {
            anyhow::bail!("generator.model must not be empty");
        }
        if self.pipeline.category.trim().is_empty() {
            anyhow::bail!("pipeline.category must not be empty");
        }

        match self.dedup.strategy.as_str() {
            "model" => {}
            "embedding" => {
                if !(0.0..=1.0).contains(&self.dedup.threshold) {
                    anyhow::bail!("dedup.threshold must be in [0.0, 1.0]");
                }
            }
            other => anyhow::bail!(
                "Unknown dedup strategy: '{}'. Must be model or embedding.",
                other
            ),
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.generator.model, "gpt-4o-mini");
        assert_eq!(cfg.pipeline.ideas_per_run, 5);
        assert_eq!(cfg.pipeline.content_per_run, 3);
        assert_eq!(cfg.pipeline.category, "programming");
        assert_eq!(cfg.pipeline.word_count, 800);
        assert_eq!(cfg.schedule.interval_minutes, 60);
        assert_eq!(cfg.db.path, PathBuf::from("content_generator.db"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let cfg: Config = toml::from_str(
            r#"
[pipeline]
category = "web development"
similarity_window = 50

[dedup]
strategy = "embedding"
"#,
        )
        .unwrap();
        assert_eq!(cfg.pipeline.category, "web development");
        assert_eq!(cfg.pipeline.similarity_window, Some(50));
        assert_eq!(cfg.pipeline.ideas_per_run, 5);
        assert_eq!(cfg.dedup.embedding_model, "text-embedding-3-small");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let cfg: Config = toml::from_str("[dedup]\nstrategy = \"fuzzy\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cfg: Config = toml::from_str("[schedule]\ninterval_minutes = 0\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_interval_upper_bound() {
        let mut cfg = Config::minimal();
        cfg.schedule.interval_minutes = MAX_INTERVAL_MINUTES;
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.schedule.interval(), Duration::from_secs(7 * 24 * 3600));

        cfg.schedule.interval_minutes = u64::MAX;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("interval_minutes"), "got: {}", err);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.generator.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[pipeline\n").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
