//! # Content Generator
//!
//! An unattended pipeline that asks a language model for programming topic
//! ideas, filters out ones already covered (exact title match, then a
//! semantic similarity check), stores the survivors in SQLite, and writes an
//! article for every idea that does not have one yet.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Generator  │──▶│   Ingest    │──▶│  SQLite   │
//! │  (OpenAI)   │   │ exact+judge │   │ ideas     │
//! └──────┬──────┘   └─────────────┘   │ content   │
//!        │                            └────┬─────┘
//!        │          ┌─────────────┐        │
//!        └─────────▶│  Generate   │◀───────┘
//!                   │  articles   │  pending ideas
//!                   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cgen init                          # create database
//! cgen run                           # one cycle
//! cgen run --mode periodic --interval 30
//! cgen stats
//! cgen ideas --pending
//! cgen show 12
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | Idea/content persistence (SQLite, in-memory) |
//! | [`generator`] | Language model backend |
//! | [`embedding`] | Embedding backend for the embedding judge |
//! | [`dedup`] | Similarity judges |
//! | [`ingest`] | Candidate deduplication and insertion |
//! | [`generate`] | Article generation for pending ideas |
//! | [`cycle`] | Cycle orchestration, once/periodic drivers |
//! | [`stats`] | `cgen stats` |
//! | [`show`] | `cgen ideas` / `cgen show` |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod cycle;
pub mod db;
pub mod dedup;
pub mod embedding;
pub mod generate;
pub mod generator;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod show;
pub mod stats;
pub mod store;
