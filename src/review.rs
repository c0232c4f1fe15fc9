//! The `blens review` command.
//!
//! Approves or rejects prompts before they are sent to platforms. Acts on
//! a single prompt id, or on every pending prompt in a batch.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::PromptStatus;
use crate::store;

pub async fn run_review(
    config: &Config,
    status: PromptStatus,
    prompt_id: Option<&str>,
    batch_id: Option<&str>,
) -> Result<()> {
    let pool = db::connect(config).await?;

    match (prompt_id, batch_id) {
        (Some(id), None) => {
            if store::set_prompt_status(&pool, id, status).await? {
                println!("Prompt {} marked {}", id, status.as_str());
            } else {
                pool.close().await;
                bail!("prompt not found: {}", id);
            }
        }
        (None, Some(batch)) => {
            let updated = store::set_pending_status_for_batch(&pool, batch, status).await?;
            println!(
                "{} pending prompts in batch {} marked {}",
                updated,
                batch,
                status.as_str()
            );
        }
        _ => {
            pool.close().await;
            bail!("specify exactly one of a prompt id or --batch");
        }
    }

    pool.close().await;
    Ok(())
}

/// List prompts awaiting review, optionally scoped to a batch.
pub async fn run_review_list(config: &Config, batch_id: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let prompts = store::list_prompts(&pool, batch_id, Some(PromptStatus::Pending)).await?;
    pool.close().await;

    if prompts.is_empty() {
        println!("No prompts pending review.");
        return Ok(());
    }

    println!("{} prompts pending review:", prompts.len());
    for prompt in &prompts {
        println!(
            "  {}  [{} / {}]  {}",
            prompt.id, prompt.category, prompt.intent_type, prompt.text
        );
    }
    Ok(())
}
