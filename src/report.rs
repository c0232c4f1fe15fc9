//! The `blens analyze` command.
//!
//! Scores every imported response against the brand lexicon, aggregates
//! visibility along the requested dimension, ranks gap opportunities, and
//! prints a text report or writes the full JSON payload to a file.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::aggregate::{aggregate, AggregateReport, GroupBy, ScoredResult};
use crate::config::Config;
use crate::db;
use crate::gaps::{rank_opportunities, RankerParams};
use crate::generate::load_personas;
use crate::models::{Opportunity, Tier};
use crate::score::MentionScorer;
use crate::store;

pub async fn run_analyze(config: &Config, group_by: &str, json: Option<&Path>) -> Result<()> {
    let group_by = match GroupBy::parse(group_by) {
        Some(g) => g,
        None => bail!(
            "Unknown group-by dimension: '{}'. Must be persona, category, platform, intent_type, or none.",
            group_by
        ),
    };

    let pool = db::connect(config).await?;
    let joined = store::load_responses_joined(&pool).await?;
    pool.close().await;

    // Persona ids map to display names when the personas file is present;
    // unknown ids fall back to the raw id.
    let persona_names: BTreeMap<String, String> = load_personas(&config.inputs.personas_file)
        .map(|personas| personas.into_iter().map(|p| (p.id, p.name)).collect())
        .unwrap_or_default();

    let scorer = MentionScorer::new(&config.brand)?;
    let results: Vec<ScoredResult> = joined
        .into_iter()
        .map(|j| ScoredResult {
            prompt_id: j.prompt_id,
            persona: persona_names
                .get(&j.persona_id)
                .cloned()
                .unwrap_or(j.persona_id),
            category: j.category,
            intent_type: j.intent_type,
            platform: j.platform,
            score: scorer.score(&j.response_text),
        })
        .collect();

    let report = aggregate(&results, group_by);
    let params = RankerParams {
        top_k: config.ranking.top_k,
        small_sample_threshold: config.ranking.small_sample_threshold,
        min_gap_points: config.ranking.min_gap_points,
    };
    let opportunities = rank_opportunities(&results, &params);

    if let Some(path) = json {
        let payload = serde_json::json!({
            "brand": config.brand.brand_name,
            "report": report,
            "opportunities": opportunities,
        });
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        eprintln!(
            "Exported report for {} responses to {}",
            report.total_responses,
            path.display()
        );
        return Ok(());
    }

    print_report(&config.brand.brand_name, &report, &opportunities);
    Ok(())
}

fn print_report(brand: &str, report: &AggregateReport, opportunities: &[Opportunity]) {
    println!("BrandLens — Visibility Report for {}", brand);
    println!("=========================================");
    println!();
    println!("  Responses analyzed: {}", report.total_responses);

    if report.total_responses == 0 {
        println!();
        println!("  No responses imported yet. Run `blens import <file>` first.");
        return;
    }

    let l = &report.landscape;
    println!();
    println!("  Competitive landscape:");
    println!("    Brand only:               {}", l.brand_only);
    println!("    Brand with competitors:   {}", l.brand_with_competitors);
    println!("    Competitors only:         {}", l.competitors_only);
    println!("    Neither mentioned:        {}", l.none_mentioned);

    let b = &report.prominence_bands;
    println!();
    println!("  Prominence bands:");
    println!("    High (>= 7):   {}", b.high);
    println!("    Medium (4-7):  {}", b.medium);
    println!("    Low (< 4):     {}", b.low);
    println!("    None (0):      {}", b.none);

    println!();
    println!("  By {}:", report.group_by);
    println!(
        "  {:<24} {:>7} {:>10} {:>10} {:>8}",
        "SEGMENT", "SAMPLE", "VISIBLE %", "AVG PROM", "SOV %"
    );
    println!("  {}", "-".repeat(64));
    for group in &report.groups {
        let prom = if group.zero_mention_sample {
            "-".to_string()
        } else {
            format!("{:.1}", group.avg_prominence)
        };
        println!(
            "  {:<24} {:>7} {:>10.1} {:>10} {:>8.1}",
            group.segment,
            group.sample_size,
            group.visibility_rate_pct,
            prom,
            group.share_of_voice_pct
        );
    }

    println!();
    if opportunities.is_empty() {
        println!("  No gap opportunities found.");
        return;
    }

    println!("  Top opportunities:");
    println!(
        "  {:<24} {:<12} {:>7} {:>7} {:>8}   {}",
        "SEGMENT", "DIMENSION", "GAP", "SAMPLE", "IMPACT", "TIER"
    );
    println!("  {}", "-".repeat(76));
    for opp in opportunities {
        println!(
            "  {:<24} {:<12} {:>+7.1} {:>7} {:>8.0}   {}",
            opp.segment,
            opp.dimension,
            opp.gap_points,
            opp.sample_size,
            opp.impact_score,
            tier_label(opp.tier)
        );
    }
}

fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::QuickWin => "quick win",
        Tier::MediumTerm => "medium term",
        Tier::LongTerm => "long term",
    }
}
