//! Cycle orchestration and the single-shot / periodic drivers.
//!
//! A cycle runs ingestion (new ideas in) followed by generation (articles
//! for every pending idea, including ones ingested moments earlier), then
//! reports aggregate counts. The periodic driver sleeps only after a cycle
//! finishes, so cycles never overlap.
//!
//! ```text
//!            run_cycle()
//!   Idle ───────────────▶ Running
//!    ▲                       │
//!    └───────────────────────┘
//!        report / error
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::dedup::{create_judge, SimilarityJudge};
use crate::generate::{generate_pending, GenerationReport};
use crate::generator::{Generator, OpenAiGenerator};
use crate::ingest::{ingest_candidates, IngestReport};
use crate::models::Stats;
use crate::store::{IdeaStore, SqliteStore};

/// Knobs for one cycle, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub ideas_per_run: usize,
    /// `None` generates for every pending idea.
    pub content_per_run: Option<usize>,
    pub category: String,
    pub word_count: u32,
    pub similarity_window: Option<usize>,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        let p = &config.pipeline;
        Self {
            ideas_per_run: p.ideas_per_run,
            content_per_run: (p.content_per_run > 0).then_some(p.content_per_run),
            category: p.category.clone(),
            word_count: p.word_count,
            similarity_window: p.similarity_window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Idle,
    Running,
}

/// Everything a cycle did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub ingest: IngestReport,
    pub generation: GenerationReport,
    pub stats: Stats,
    /// Set when the idea request itself failed and the batch was empty.
    pub idea_error: Option<String>,
}

/// Owns the injected collaborators and runs cycles over them.
pub struct Pipeline {
    store: Arc<dyn IdeaStore>,
    generator: Arc<dyn Generator>,
    judge: Arc<dyn SimilarityJudge>,
    settings: PipelineSettings,
    state: CycleState,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn IdeaStore>,
        generator: Arc<dyn Generator>,
        judge: Arc<dyn SimilarityJudge>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            generator,
            judge,
            settings,
            state: CycleState::Idle,
        }
    }

    /// Run one ingestion + generation pass.
    ///
    /// Backend failures are absorbed and reported; storage failures abort the
    /// cycle and are returned.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.transition(CycleState::Running);
        let result = self.cycle_inner().await;
        self.transition(CycleState::Idle);
        result
    }

    fn transition(&mut self, next: CycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }

    async fn cycle_inner(&self) -> Result<CycleReport> {
        let started = chrono::Utc::now();
        tracing::info!(at = %started.format("%Y-%m-%d %H:%M:%S"), "running generation cycle");

        let before = self.store.stats().await?;
        tracing::info!(stats = %before, "current stats");

        let mut report = CycleReport::default();

        let candidates = match self
            .generator
            .generate_ideas(self.settings.ideas_per_run, &self.settings.category)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "idea generation failed");
                report.idea_error = Some(e.to_string());
                Vec::new()
            }
        };

        if candidates.is_empty() {
            tracing::warn!("no ideas generated");
        }

        report.ingest = ingest_candidates(
            self.store.as_ref(),
            self.judge.as_ref(),
            &candidates,
            self.settings.similarity_window,
        )
        .await?;

        report.generation = generate_pending(
            self.store.as_ref(),
            self.generator.as_ref(),
            self.settings.content_per_run,
            self.settings.word_count,
        )
        .await?;

        report.stats = self.store.stats().await?;
        tracing::info!(stats = %report.stats, "updated stats");
        tracing::info!("cycle complete");

        Ok(report)
    }

    /// Single-shot driver.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        tracing::info!("running in one-shot mode");
        self.run_cycle().await
    }

    /// Periodic driver. Runs until the process is terminated.
    pub async fn run_periodic(&mut self, interval: Duration) -> Result<()> {
        self.run_periodic_cycles(interval, None).await
    }

    /// Periodic driver stopping after `max_cycles` cycles when set.
    ///
    /// Boundaries are measured from the driver's start. Boundaries missed
    /// while a long cycle ran are skipped, not replayed.
    pub async fn run_periodic_cycles(
        &mut self,
        interval: Duration,
        max_cycles: Option<usize>,
    ) -> Result<()> {
        tracing::info!(
            interval_secs = interval.as_secs(),
            "starting periodic service"
        );
        let start = tokio::time::Instant::now();
        let mut completed = 0usize;

        loop {
            if let Err(e) = self.run_cycle().await {
                let msg = format!("{:#}", e);
                tracing::error!(error = %msg, "generation cycle failed");
            }
            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                return Ok(());
            }

            let wait = until_next_boundary(start.elapsed(), interval);
            tracing::info!(next_in_secs = wait.as_secs(), "waiting for next cycle");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Outer driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Periodic(Duration),
}

/// Wire the production collaborators from config and drive them.
pub async fn run_from_config(config: &Config, mode: RunMode) -> Result<()> {
    let generator: Arc<dyn Generator> = Arc::new(
        OpenAiGenerator::new(&config.generator).context("Failed to create generator")?,
    );
    let judge = create_judge(config, generator.clone())?;
    let store = Arc::new(SqliteStore::open(config).await?);
    tracing::info!(
        model = generator.model_name(),
        dedup = judge.name(),
        db = %config.db.path.display(),
        "pipeline ready"
    );

    let mut pipeline = Pipeline::new(
        store.clone(),
        generator,
        judge,
        PipelineSettings::from(config),
    );

    let result = match mode {
        RunMode::Once => pipeline.run_once().await.map(|report| print_summary(&report)),
        RunMode::Periodic(interval) => pipeline.run_periodic(interval).await,
    };

    store.close().await;
    result
}

fn print_summary(report: &CycleReport) {
    println!("cycle");
    if let Some(ref err) = report.idea_error {
        println!("  idea request failed: {}", err);
    }
    println!("  ideas inserted: {}", report.ingest.inserted);
    println!("  exact duplicates: {}", report.ingest.exact_duplicates);
    println!("  similar duplicates: {}", report.ingest.semantic_duplicates);
    if report.ingest.judge_failures > 0 {
        println!("  similarity checks failed: {}", report.ingest.judge_failures);
    }
    println!("  articles generated: {}", report.generation.generated);
    println!("  articles failed: {}", report.generation.failed);
    println!("  total ideas: {}", report.stats.total_ideas);
    println!("  pending ideas: {}", report.stats.pending_ideas);
    println!("ok");
}

/// Time from `elapsed` to the next multiple of `interval` strictly after it.
pub fn until_next_boundary(elapsed: Duration, interval: Duration) -> Duration {
    let interval_ns = interval.as_nanos().max(1);
    let elapsed_ns = elapsed.as_nanos();
    let next = (elapsed_ns / interval_ns + 1) * interval_ns;
    Duration::from_nanos((next - elapsed_ns) as u64)
}
