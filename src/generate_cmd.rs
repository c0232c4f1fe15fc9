//! The `blens generate` command.
//!
//! Loads personas and keywords, seeds the similarity index with every
//! prompt already stored (so a new batch dedups against prior ones), runs
//! the generator, and persists the batch.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::dedup::SimilarityIndex;
use crate::generate::{load_keywords, load_personas, PromptGenerator};
use crate::llm;
use crate::models::{Batch, BatchStatus};
use crate::store;

pub async fn run_generate(
    config: &Config,
    count: usize,
    batch_name: &str,
    notes: Option<String>,
) -> Result<()> {
    let personas = load_personas(&config.inputs.personas_file)?;
    let keywords = load_keywords(&config.inputs.keywords_file)?;

    println!("Generating {} prompts", count);
    println!(
        "  Personas: {}   Keywords: {}   Dedup: {}",
        personas.len(),
        keywords.len(),
        config.generation.dedup_mode
    );
    println!(
        "  Competitor ratio: {:.0}%   LLM: {}",
        config.generation.competitor_ratio * 100.0,
        if config.llm.is_enabled() {
            config.llm.model.as_deref().unwrap_or("?")
        } else {
            "disabled"
        }
    );
    println!();

    let mut generator =
        PromptGenerator::new(personas, keywords, config.generation.clone())?;

    let pool = db::connect(config).await?;

    let mut index = SimilarityIndex::new(
        config.generation.high_similarity_threshold,
        config.generation.fuzzy_threshold,
    );
    for text in store::all_prompt_texts(&pool).await? {
        index.insert(&text);
    }
    if !index.is_empty() {
        println!("Seeded dedup index with {} existing prompts", index.len());
    }

    let provider = if config.llm.is_enabled() {
        Some(llm::create_provider(&config.llm)?)
    } else {
        None
    };

    let batch = Batch {
        batch_id: format!("batch_{}", Uuid::new_v4().simple()),
        batch_name: batch_name.to_string(),
        date_added: Utc::now(),
        status: BatchStatus::Active,
        notes: notes.unwrap_or_default(),
    };

    let outcome = generator
        .generate(
            count,
            &batch.batch_id,
            &mut index,
            provider.as_ref().map(|p| (p.as_ref(), &config.llm)),
        )
        .await?;

    store::insert_batch(&pool, &batch).await?;
    store::insert_prompts(&pool, &outcome.prompts).await?;
    pool.close().await;

    println!(
        "Accepted {} / {} prompts into batch {} ({})",
        outcome.accepted, outcome.requested, batch.batch_id, batch.batch_name
    );
    if outcome.exhausted_slots > 0 {
        println!(
            "  {} slots exhausted after {} retries each ({} duplicate candidates rejected)",
            outcome.exhausted_slots,
            config.generation.max_retries_per_slot,
            outcome.duplicates_rejected
        );
    } else if outcome.duplicates_rejected > 0 {
        println!(
            "  {} duplicate candidates rejected and regenerated",
            outcome.duplicates_rejected
        );
    }
    if outcome.llm_generated > 0 {
        println!("  {} prompts written by the LLM", outcome.llm_generated);
    }

    println!();
    println!("  By persona:");
    for (name, n) in &outcome.by_persona {
        println!("    {:<28} {:>5}", name, n);
    }
    println!("  By category:");
    for (name, n) in &outcome.by_category {
        println!("    {:<28} {:>5}", name, n);
    }
    println!("  By intent:");
    for (name, n) in &outcome.by_intent {
        println!("    {:<28} {:>5}", name, n);
    }
    println!("  With competitor mentions: {}", outcome.with_competitors);

    Ok(())
}
