//! # Content Generator CLI (`cgen`)
//!
//! ## Usage
//!
//! ```bash
//! cgen --config ./config/cgen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cgen init` | Create the SQLite database and run schema migrations |
//! | `cgen run` | Run one cycle, or keep running on an interval |
//! | `cgen stats` | Show idea and article counts |
//! | `cgen ideas` | List stored ideas |
//! | `cgen show <id>` | Print an idea and its article |
//!
//! The API key is read from the environment variable named by
//! `[generator] api_key_env` (default `OPENAI_API_KEY`). A `.env` file in
//! the working directory is loaded first.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use content_generator::config::{self, Config};
use content_generator::cycle::{self, RunMode};
use content_generator::models::IdeaFilter;
use content_generator::{logging, migrate, show, stats};

/// Content Generator CLI: invents programming topics, skips ones already
/// covered, and writes articles into SQLite.
#[derive(Parser)]
#[command(
    name = "cgen",
    about = "Content Generator: an LLM topic and article pipeline backed by SQLite",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/cgen.toml`. Built-in defaults are used when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/cgen.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Run a single cycle and exit.
    Once,
    /// Run a cycle every `--interval` minutes until terminated.
    Periodic,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the `ideas` and `content` tables. Safe to
    /// run more than once.
    Init,

    /// Run the generation pipeline.
    ///
    /// A cycle requests new ideas, drops duplicates, stores the rest, and
    /// writes articles for pending ideas.
    Run {
        #[arg(long, value_enum, default_value = "once")]
        mode: Mode,

        /// Minutes between periodic cycles. Overrides `[schedule] interval_minutes`.
        #[arg(long)]
        interval: Option<u64>,

        /// Ideas to request per cycle.
        #[arg(long)]
        ideas: Option<usize>,

        /// Maximum articles per cycle (0 = all pending).
        #[arg(long)]
        content: Option<usize>,

        /// Topic category passed to the model.
        #[arg(long)]
        category: Option<String>,

        /// Model name.
        #[arg(long)]
        model: Option<String>,

        /// Database path.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show database statistics.
    Stats,

    /// List stored ideas.
    Ideas {
        /// Only ideas still waiting for an article.
        #[arg(long, conflicts_with = "completed")]
        pending: bool,

        /// Only ideas that already have an article.
        #[arg(long)]
        completed: bool,

        /// Maximum number of ideas to list.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print an idea and its article.
    Show {
        /// Idea id (from `cgen ideas`).
        id: i64,
    },
}

struct RunOverrides {
    interval: Option<u64>,
    ideas: Option<usize>,
    content: Option<usize>,
    category: Option<String>,
    model: Option<String>,
    db: Option<PathBuf>,
}

fn apply_overrides(cfg: &mut Config, o: RunOverrides) -> anyhow::Result<()> {
    if let Some(minutes) = o.interval {
        cfg.schedule.interval_minutes = minutes;
    }
    if let Some(n) = o.ideas {
        cfg.pipeline.ideas_per_run = n;
    }
    if let Some(n) = o.content {
        cfg.pipeline.content_per_run = n;
    }
    if let Some(category) = o.category {
        cfg.pipeline.category = category;
    }
    if let Some(model) = o.model {
        cfg.generator.model = model;
    }
    if let Some(path) = o.db {
        cfg.db.path = path;
    }
    cfg.validate()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = config::load_or_default(&cli.config)?;
    logging::init(&cfg.log.filter);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Run {
            mode,
            interval,
            ideas,
            content,
            category,
            model,
            db,
        } => {
            apply_overrides(
                &mut cfg,
                RunOverrides {
                    interval,
                    ideas,
                    content,
                    category,
                    model,
                    db,
                },
            )?;

            let mode = match mode {
                Mode::Once => RunMode::Once,
                Mode::Periodic => RunMode::Periodic(cfg.schedule.interval()),
            };
            cycle::run_from_config(&cfg, mode).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Ideas {
            pending,
            completed,
            limit,
        } => {
            let filter = if pending {
                IdeaFilter::Pending
            } else if completed {
                IdeaFilter::Completed
            } else {
                IdeaFilter::All
            };
            show::run_list(&cfg, filter, limit).await?;
        }
        Commands::Show { id } => {
            show::run_show(&cfg, id).await?;
        }
    }

    Ok(())
}
