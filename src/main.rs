//! # BrandLens CLI (`blens`)
//!
//! The `blens` binary drives the prompt-generation and visibility-analysis
//! pipeline from the command line.
//!
//! ## Usage
//!
//! ```bash
//! blens --config ./config/blens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `blens init` | Create the SQLite database and run schema migrations |
//! | `blens generate` | Generate a deduplicated batch of test prompts |
//! | `blens review` | Approve or reject prompts before use |
//! | `blens import <file>` | Record platform responses from a JSON file |
//! | `blens analyze` | Score responses and print the visibility + gap report |
//! | `blens batch` | List, archive, or reactivate prompt batches |
//! | `blens stats` | Show database counts and per-batch breakdowns |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use brandlens::models::{BatchStatus, PromptStatus};
use brandlens::{batch_cmd, config, generate_cmd, ingest, migrate, report, review, stats};

/// BrandLens CLI — measure how visible a brand is in AI assistant answers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/blens.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "blens",
    about = "BrandLens — brand visibility analytics for AI assistant responses",
    version,
    long_about = "BrandLens generates persona-weighted test prompts with near-duplicate \
    screening, records the responses AI platforms give back, and reports brand visibility, \
    prominence, and competitive gap opportunities per audience segment."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/blens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (batches,
    /// prompts, responses). This command is idempotent — running it
    /// multiple times is safe.
    Init,

    /// Generate a batch of test prompts.
    ///
    /// Distributes the requested count across personas by weight, fills
    /// slots from keyword data, and screens every candidate against all
    /// previously stored prompts. A run that cannot fill every slot still
    /// stores the prompts it produced.
    Generate {
        /// Number of prompts to generate.
        #[arg(long, default_value_t = 100)]
        count: usize,

        /// Human-readable batch name.
        #[arg(long, default_value = "untitled")]
        name: String,

        /// Free-form note stored with the batch.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Review generated prompts before sending them to platforms.
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Import platform responses from a JSON file.
    ///
    /// The file holds an array of records with `prompt_id`, `platform`,
    /// `response_text`, and an RFC 3339 `timestamp`. Records for unknown
    /// prompt ids are skipped with a warning.
    Import {
        /// Path to the responses JSON file.
        file: PathBuf,
    },

    /// Score all imported responses and print the visibility report.
    ///
    /// Includes the competitive landscape, prominence bands, per-segment
    /// visibility, share of voice, and ranked gap opportunities.
    Analyze {
        /// Grouping dimension: persona, category, platform, intent_type, or none.
        #[arg(long, default_value = "persona")]
        group_by: String,

        /// Write the full report as JSON to this path instead of printing text.
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,
    },

    /// Manage prompt batches.
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },

    /// Show database statistics.
    Stats,
}

/// Review subcommands.
#[derive(Subcommand)]
enum ReviewAction {
    /// List prompts pending review.
    List {
        /// Restrict to one batch.
        #[arg(long)]
        batch: Option<String>,
    },
    /// Approve a prompt, or every pending prompt in a batch.
    Approve {
        /// Prompt id to approve.
        prompt_id: Option<String>,
        /// Approve all pending prompts in this batch.
        #[arg(long)]
        batch: Option<String>,
    },
    /// Reject a prompt, or every pending prompt in a batch.
    Reject {
        /// Prompt id to reject.
        prompt_id: Option<String>,
        /// Reject all pending prompts in this batch.
        #[arg(long)]
        batch: Option<String>,
    },
}

/// Batch subcommands.
#[derive(Subcommand)]
enum BatchAction {
    /// List all batches, newest first.
    List,
    /// Archive a batch (its prompts drop out of the default review flow).
    Archive {
        /// Batch id to archive.
        batch_id: String,
    },
    /// Reactivate an archived batch.
    Activate {
        /// Batch id to reactivate.
        batch_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Generate { count, name, notes } => {
            generate_cmd::run_generate(&cfg, count, &name, notes).await?;
        }
        Commands::Review { action } => match action {
            ReviewAction::List { batch } => {
                review::run_review_list(&cfg, batch.as_deref()).await?;
            }
            ReviewAction::Approve { prompt_id, batch } => {
                review::run_review(
                    &cfg,
                    PromptStatus::Approved,
                    prompt_id.as_deref(),
                    batch.as_deref(),
                )
                .await?;
            }
            ReviewAction::Reject { prompt_id, batch } => {
                review::run_review(
                    &cfg,
                    PromptStatus::Rejected,
                    prompt_id.as_deref(),
                    batch.as_deref(),
                )
                .await?;
            }
        },
        Commands::Import { file } => {
            ingest::run_import(&cfg, &file).await?;
        }
        Commands::Analyze { group_by, json } => {
            report::run_analyze(&cfg, &group_by, json.as_deref()).await?;
        }
        Commands::Batch { action } => match action {
            BatchAction::List => {
                batch_cmd::run_batch_list(&cfg).await?;
            }
            BatchAction::Archive { batch_id } => {
                batch_cmd::run_batch_set_status(&cfg, &batch_id, BatchStatus::Archived).await?;
            }
            BatchAction::Activate { batch_id } => {
                batch_cmd::run_batch_set_status(&cfg, &batch_id, BatchStatus::Active).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
