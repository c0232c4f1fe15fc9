//! The `blens batch` command.
//!
//! Lists generation batches and moves them between active and archived.
//! Archiving never deletes prompts; archived batches simply drop out of
//! the default review flow.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::BatchStatus;
use crate::store;

pub async fn run_batch_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let batches = store::list_batches(&pool).await?;
    pool.close().await;

    if batches.is_empty() {
        println!("No batches yet. Run `blens generate` to create one.");
        return Ok(());
    }

    println!(
        "{:<40} {:<20} {:<10} {}",
        "BATCH ID", "NAME", "STATUS", "CREATED"
    );
    println!("{}", "-".repeat(88));
    for batch in &batches {
        println!(
            "{:<40} {:<20} {:<10} {}",
            batch.batch_id,
            batch.batch_name,
            batch.status.as_str(),
            batch.date_added.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub async fn run_batch_set_status(
    config: &Config,
    batch_id: &str,
    status: BatchStatus,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let found = store::set_batch_status(&pool, batch_id, status).await?;
    pool.close().await;

    if !found {
        bail!("batch not found: {}", batch_id);
    }
    println!("Batch {} is now {}", batch_id, status.as_str());
    Ok(())
}
