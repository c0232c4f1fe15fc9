//! The `blens import` command.
//!
//! Reads platform responses from a JSON file and records them against
//! their prompts. Records whose prompt id is unknown are skipped with a
//! warning rather than failing the whole import.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::models::ResponseRecord;
use crate::store;

pub async fn run_import(config: &Config, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read responses file: {}", file.display()))?;
    let records: Vec<ResponseRecord> =
        serde_json::from_str(&content).with_context(|| "Failed to parse responses file")?;

    if records.is_empty() {
        println!("No responses found in {}", file.display());
        return Ok(());
    }

    let pool = db::connect(config).await?;

    let known_ids: HashSet<String> = store::list_prompts(&pool, None, None)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let (accepted, skipped): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| known_ids.contains(&r.prompt_id));

    store::insert_responses(&pool, &accepted).await?;
    pool.close().await;

    println!("Imported {} responses from {}", accepted.len(), file.display());
    for record in &skipped {
        println!("  Skipped response for unknown prompt: {}", record.prompt_id);
    }

    Ok(())
}
