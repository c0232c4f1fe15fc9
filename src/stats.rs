//! Database statistics overview.
//!
//! Quick summary of what's stored: prompt counts by review status,
//! response totals, and a per-batch breakdown. Used by `blens stats` to
//! confirm that generation runs and imports landed as expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let by_status = store::count_prompts_by_status(&pool).await?;
    let total_prompts: i64 = by_status.iter().map(|&(_, n)| n).sum();
    let total_responses = store::count_responses(&pool).await?;
    let per_batch = store::count_per_batch(&pool).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("BrandLens — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Prompts:     {}", total_prompts);
    for (status, n) in &by_status {
        println!("    {:<10} {}", status, n);
    }
    println!("  Responses:   {}", total_responses);

    if !per_batch.is_empty() {
        println!();
        println!("  By batch:");
        println!("  {:<40} {:>8} {:>10}", "BATCH", "PROMPTS", "RESPONSES");
        println!("  {}", "-".repeat(60));
        for (batch_id, prompts, responses) in &per_batch {
            println!("  {:<40} {:>8} {:>10}", batch_id, prompts, responses);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
