//! Gap analysis: turns aggregated per-segment visibility into a
//! prioritized opportunity list.
//!
//! Segments are collected in three grouping passes (persona, category,
//! intent type). For each segment the gap is the mean competitor visibility
//! rate minus the brand's rate, and
//! `impact = gap_fraction × sample_size × 100`, so well-evidenced gaps
//! outrank noisy small samples. The impact formula is a documented
//! heuristic, not a business-value model; monetary multipliers are the
//! caller's concern and are deliberately absent here.

use crate::aggregate::{aggregate, GroupBy, GroupReport, ScoredResult};
use crate::models::{Opportunity, Tier};

/// Tiering knobs, carried in `[ranking]` config.
#[derive(Debug, Clone)]
pub struct RankerParams {
    /// Segments eligible for the quick-win tier.
    pub top_k: usize,
    /// Sample sizes below this count as "small".
    pub small_sample_threshold: usize,
    /// Minimum gap (percentage points) for quick_win / medium_term.
    pub min_gap_points: f64,
}

impl Default for RankerParams {
    fn default() -> Self {
        Self {
            top_k: 3,
            small_sample_threshold: 30,
            min_gap_points: 15.0,
        }
    }
}

/// Rank visibility gaps across persona, category, and intent-type passes.
///
/// Returns an empty list when there is no data to rank. Segments where the
/// brand is ahead (negative gap) are never tiered quick_win or medium_term.
pub fn rank_opportunities(results: &[ScoredResult], params: &RankerParams) -> Vec<Opportunity> {
    if results.is_empty() {
        return Vec::new();
    }

    let passes = [GroupBy::Persona, GroupBy::Category, GroupBy::IntentType];

    let mut opportunities: Vec<Opportunity> = Vec::new();
    for group_by in passes {
        let report = aggregate(results, group_by);
        for group in &report.groups {
            opportunities.push(opportunity_from_group(group, group_by));
        }
    }

    // Deduplicate by segment identity across passes, keeping the
    // highest-impact occurrence (pass order breaks exact ties).
    opportunities.sort_by(|a, b| {
        a.segment.cmp(&b.segment).then_with(|| {
            b.impact_score
                .partial_cmp(&a.impact_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
    opportunities.dedup_by(|next, kept| kept.segment == next.segment);

    opportunities.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.sample_size.cmp(&a.sample_size))
            .then_with(|| a.segment.cmp(&b.segment))
    });

    for (rank, opp) in opportunities.iter_mut().enumerate() {
        opp.tier = assign_tier(rank, opp, params);
    }

    opportunities
}

fn opportunity_from_group(group: &GroupReport, group_by: GroupBy) -> Opportunity {
    // Mean over all competitors seen in the segment, not just the leader.
    let competitor_avg_pct = if group.competitor_breakdown.is_empty() {
        0.0
    } else {
        group
            .competitor_breakdown
            .iter()
            .map(|c| c.mention_rate_pct)
            .sum::<f64>()
            / group.competitor_breakdown.len() as f64
    };

    let gap_points = competitor_avg_pct - group.visibility_rate_pct;
    let impact_score = gap_points / 100.0 * group.sample_size as f64 * 100.0;

    Opportunity {
        segment: group.segment.clone(),
        dimension: group_by.as_str().to_string(),
        current_visibility_pct: group.visibility_rate_pct,
        competitor_avg_pct,
        gap_points,
        sample_size: group.sample_size,
        impact_score,
        // Placeholder; assigned after the global sort.
        tier: Tier::LongTerm,
    }
}

fn assign_tier(rank: usize, opp: &Opportunity, params: &RankerParams) -> Tier {
    if opp.gap_points < params.min_gap_points {
        return Tier::LongTerm;
    }
    if rank < params.top_k && opp.sample_size < params.small_sample_threshold {
        Tier::QuickWin
    } else {
        Tier::MediumTerm
    }
}
