//! # BrandLens
//!
//! A brand-visibility analytics toolkit for AI assistant responses.
//!
//! BrandLens generates natural test prompts from personas and keyword
//! data, screens them for near-duplicates, and scores the responses that
//! platforms give back: who got mentioned, how prominently, and where the
//! brand trails its competitors.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Personas +    │──▶│  Generator   │──▶│  SQLite   │
//! │ Keywords      │   │ + Dedup     │   │ prompts  │
//! └───────────────┘   └─────────────┘   └────┬─────┘
//!                                            │
//!                  imported responses ──────▶│
//!                                            ▼
//!                     ┌──────────┐   ┌──────────────┐
//!                     │  Scorer  │──▶│ Aggregate +   │
//!                     │          │   │ Gap Ranking  │
//!                     └──────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! blens init                          # create database
//! blens generate --count 200         # build a prompt batch
//! blens review list                  # inspect pending prompts
//! blens import responses.json        # record platform answers
//! blens analyze --group-by persona   # visibility + gap report
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`dedup`] | Near-duplicate prompt detection |
//! | [`templates`] | Prompt template tables |
//! | [`generate`] | Weighted prompt generation |
//! | [`llm`] | LLM provider abstraction |
//! | [`score`] | Mention detection and prominence scoring |
//! | [`aggregate`] | Per-segment visibility aggregation |
//! | [`gaps`] | Gap analysis and opportunity tiering |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`store`] | Prompt, batch, and response persistence |

pub mod aggregate;
pub mod batch_cmd;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod gaps;
pub mod generate;
pub mod generate_cmd;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod report;
pub mod review;
pub mod score;
pub mod stats;
pub mod store;
pub mod templates;
