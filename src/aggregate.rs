//! Rollup of per-response visibility scores into rate and share-of-voice
//! statistics, sliceable by one metadata dimension.
//!
//! Aggregation uses commutative, order-independent reductions (counts and
//! sums), so scoring order never affects the report. An empty input yields
//! an all-zero report rather than an error: a report with missing data is
//! more useful than a crashed run.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::VisibilityScore;

/// Metadata dimension to slice by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Persona,
    Category,
    Platform,
    IntentType,
    None,
}

impl GroupBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "persona" => Some(GroupBy::Persona),
            "category" => Some(GroupBy::Category),
            "platform" => Some(GroupBy::Platform),
            "intent_type" => Some(GroupBy::IntentType),
            "none" => Some(GroupBy::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Persona => "persona",
            GroupBy::Category => "category",
            GroupBy::Platform => "platform",
            GroupBy::IntentType => "intent_type",
            GroupBy::None => "none",
        }
    }
}

/// One scored response joined with its prompt's metadata.
#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub prompt_id: String,
    pub persona: String,
    pub category: String,
    pub intent_type: String,
    pub platform: String,
    pub score: VisibilityScore,
}

/// Per-competitor statistics within one group.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorStats {
    pub name: String,
    /// Percentage of responses in the group mentioning this competitor.
    pub mention_rate_pct: f64,
    /// Mean prominence over responses where this competitor appears.
    pub avg_prominence: f64,
    pub responses_mentioned: usize,
}

/// Statistics for one group (or the whole set under `GroupBy::None`).
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub segment: String,
    pub sample_size: usize,
    pub mentioned_count: usize,
    pub visibility_rate_pct: f64,
    /// Mean prominence over brand-mentioned responses; 0 when none are.
    pub avg_prominence: f64,
    /// True when `avg_prominence` is 0 because no response mentioned the
    /// brand (distinguishes "no data" from "measured zero").
    pub zero_mention_sample: bool,
    /// Brand mentions / (brand + competitor mentions) × 100; 0 when the
    /// denominator is 0.
    pub share_of_voice_pct: f64,
    /// Sorted by mention rate descending, then name ascending.
    pub competitor_breakdown: Vec<CompetitorStats>,
}

/// Result-set quadrants: who showed up where.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Landscape {
    pub brand_only: usize,
    pub brand_with_competitors: usize,
    pub competitors_only: usize,
    pub none_mentioned: usize,
}

/// Distribution of brand prominence scores across all responses.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ProminenceBands {
    /// Score ≥ 7.
    pub high: usize,
    /// 4 ≤ score < 7.
    pub medium: usize,
    /// 0 < score < 4.
    pub low: usize,
    /// Score exactly 0 (brand absent).
    pub none: usize,
}

/// Full aggregation output consumed by the ranker and report renderers.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub group_by: String,
    pub total_responses: usize,
    /// Sorted by segment name ascending for deterministic output.
    pub groups: Vec<GroupReport>,
    pub landscape: Landscape,
    pub prominence_bands: ProminenceBands,
}

/// Roll up scored results along one dimension.
pub fn aggregate(results: &[ScoredResult], group_by: GroupBy) -> AggregateReport {
    let mut buckets: BTreeMap<String, Vec<&ScoredResult>> = BTreeMap::new();
    for r in results {
        buckets.entry(segment_of(r, group_by)).or_default().push(r);
    }

    let groups = buckets
        .into_iter()
        .map(|(segment, members)| group_report(segment, &members))
        .collect();

    AggregateReport {
        group_by: group_by.as_str().to_string(),
        total_responses: results.len(),
        groups,
        landscape: landscape(results),
        prominence_bands: prominence_bands(results),
    }
}

fn segment_of(r: &ScoredResult, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Persona => r.persona.clone(),
        GroupBy::Category => r.category.clone(),
        GroupBy::Platform => r.platform.clone(),
        GroupBy::IntentType => r.intent_type.clone(),
        GroupBy::None => "all".to_string(),
    }
}

fn group_report(segment: String, members: &[&ScoredResult]) -> GroupReport {
    let sample_size = members.len();
    let mentioned: Vec<&&ScoredResult> =
        members.iter().filter(|r| r.score.brand_mentioned).collect();
    let mentioned_count = mentioned.len();

    let visibility_rate_pct = if sample_size > 0 {
        mentioned_count as f64 / sample_size as f64 * 100.0
    } else {
        0.0
    };

    let avg_prominence = if mentioned_count > 0 {
        mentioned.iter().map(|r| r.score.prominence_score).sum::<f64>() / mentioned_count as f64
    } else {
        0.0
    };

    let brand_mentions: usize = members.iter().map(|r| r.score.brand_mention_count).sum();
    let competitor_mentions: usize = members
        .iter()
        .flat_map(|r| r.score.competitor_details.values())
        .map(|c| c.mention_count)
        .sum();
    let denom = brand_mentions + competitor_mentions;
    let share_of_voice_pct = if denom > 0 {
        brand_mentions as f64 / denom as f64 * 100.0
    } else {
        0.0
    };

    GroupReport {
        segment,
        sample_size,
        mentioned_count,
        visibility_rate_pct,
        avg_prominence,
        zero_mention_sample: mentioned_count == 0,
        share_of_voice_pct,
        competitor_breakdown: competitor_breakdown(members),
    }
}

fn competitor_breakdown(members: &[&ScoredResult]) -> Vec<CompetitorStats> {
    let sample_size = members.len();
    // name → (responses mentioned, summed prominence)
    let mut per_competitor: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for r in members {
        for (name, detail) in &r.score.competitor_details {
            let entry = per_competitor.entry(name.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += detail.prominence_score;
        }
    }

    let mut breakdown: Vec<CompetitorStats> = per_competitor
        .into_iter()
        .map(|(name, (count, prominence_sum))| CompetitorStats {
            name: name.to_string(),
            mention_rate_pct: count as f64 / sample_size.max(1) as f64 * 100.0,
            avg_prominence: prominence_sum / count as f64,
            responses_mentioned: count,
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.mention_rate_pct
            .partial_cmp(&a.mention_rate_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    breakdown
}

fn landscape(results: &[ScoredResult]) -> Landscape {
    let mut l = Landscape::default();
    for r in results {
        let brand = r.score.brand_mentioned;
        let comp = !r.score.competitor_details.is_empty();
        match (brand, comp) {
            (true, false) => l.brand_only += 1,
            (true, true) => l.brand_with_competitors += 1,
            (false, true) => l.competitors_only += 1,
            (false, false) => l.none_mentioned += 1,
        }
    }
    l
}

fn prominence_bands(results: &[ScoredResult]) -> ProminenceBands {
    let mut bands = ProminenceBands::default();
    for r in results {
        let s = r.score.prominence_score;
        if s >= 7.0 {
            bands.high += 1;
        } else if s >= 4.0 {
            bands.medium += 1;
        } else if s > 0.0 {
            bands.low += 1;
        } else {
            bands.none += 1;
        }
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompetitorMention;
    use std::collections::BTreeMap;

    fn result(persona: &str, mentioned: bool, prominence: f64) -> ScoredResult {
        ScoredResult {
            prompt_id: "p1".to_string(),
            persona: persona.to_string(),
            category: "educational".to_string(),
            intent_type: "informational".to_string(),
            platform: "openai".to_string(),
            score: VisibilityScore {
                brand_mentioned: mentioned,
                brand_mention_count: usize::from(mentioned),
                prominence_score: prominence,
                competitor_details: BTreeMap::new(),
                context_snippets: Vec::new(),
            },
        }
    }

    fn with_competitor(mut r: ScoredResult, name: &str, count: usize, prom: f64) -> ScoredResult {
        r.score.competitor_details.insert(
            name.to_string(),
            CompetitorMention {
                mention_count: count,
                prominence_score: prom,
                first_mention_offset: 0,
            },
        );
        r
    }

    #[test]
    fn test_one_of_three_mentioned() {
        let results = vec![
            result("Beginner", true, 8.0),
            result("Beginner", false, 0.0),
            result("Beginner", false, 0.0),
        ];
        let report = aggregate(&results, GroupBy::None);
        assert_eq!(report.groups.len(), 1);
        let g = &report.groups[0];
        assert!((g.visibility_rate_pct - 33.333333333333336).abs() < 1e-6);
        assert!((g.avg_prominence - 8.0).abs() < 1e-9);
        assert!(!g.zero_mention_sample);
    }

    #[test]
    fn test_empty_input_all_zero_report() {
        let report = aggregate(&[], GroupBy::Persona);
        assert_eq!(report.total_responses, 0);
        assert!(report.groups.is_empty());
        assert_eq!(report.landscape, Landscape::default());
        assert_eq!(report.prominence_bands, ProminenceBands::default());
    }

    #[test]
    fn test_group_sample_sizes_partition_input() {
        let results = vec![
            result("Beginner", true, 5.0),
            result("Beginner", false, 0.0),
            result("Pro Artist", true, 7.0),
            result("Enthusiast", false, 0.0),
        ];
        let report = aggregate(&results, GroupBy::Persona);
        let total: usize = report.groups.iter().map(|g| g.sample_size).sum();
        assert_eq!(total, results.len());
    }

    #[test]
    fn test_zero_mention_group_reports_zero_not_nan() {
        let results = vec![result("Beginner", false, 0.0)];
        let report = aggregate(&results, GroupBy::Persona);
        let g = &report.groups[0];
        assert_eq!(g.avg_prominence, 0.0);
        assert!(g.zero_mention_sample);
        assert_eq!(g.share_of_voice_pct, 0.0);
    }

    #[test]
    fn test_share_of_voice() {
        let mut r = result("Beginner", true, 6.5);
        r.score.brand_mention_count = 2;
        let r = with_competitor(r, "Charlotte Tilbury", 2, 3.0);
        let report = aggregate(&[r], GroupBy::None);
        // 2 brand / (2 + 2) total mentions.
        assert!((report.groups[0].share_of_voice_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_competitor_breakdown_sorted_with_name_tiebreak() {
        let r1 = with_competitor(result("Beginner", false, 0.0), "Urban Decay", 1, 3.0);
        let r1 = with_competitor(r1, "MAC", 1, 4.0);
        let r2 = with_competitor(result("Beginner", false, 0.0), "MAC", 2, 5.0);
        let report = aggregate(&[r1, r2], GroupBy::None);
        let names: Vec<&str> = report.groups[0]
            .competitor_breakdown
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        // MAC in 2/2 responses, Urban Decay in 1/2.
        assert_eq!(names, vec!["MAC", "Urban Decay"]);

        // Equal rates fall back to name order.
        let r3 = with_competitor(result("Beginner", false, 0.0), "Urban Decay", 1, 3.0);
        let r3 = with_competitor(r3, "MAC", 1, 4.0);
        let report = aggregate(&[r3], GroupBy::None);
        let names: Vec<&str> = report.groups[0]
            .competitor_breakdown
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["MAC", "Urban Decay"]);
    }

    #[test]
    fn test_landscape_quadrants() {
        let results = vec![
            result("a", true, 7.0),
            with_competitor(result("b", true, 6.5), "MAC", 1, 3.0),
            with_competitor(result("c", false, 0.0), "MAC", 1, 7.0),
            result("d", false, 0.0),
        ];
        let l = aggregate(&results, GroupBy::None).landscape;
        assert_eq!(l.brand_only, 1);
        assert_eq!(l.brand_with_competitors, 1);
        assert_eq!(l.competitors_only, 1);
        assert_eq!(l.none_mentioned, 1);
    }

    #[test]
    fn test_prominence_bands() {
        let results = vec![
            result("a", true, 9.0),
            result("b", true, 7.0),
            result("c", true, 4.0),
            result("d", true, 3.9),
            result("e", false, 0.0),
        ];
        let bands = aggregate(&results, GroupBy::None).prominence_bands;
        assert_eq!(bands.high, 2);
        assert_eq!(bands.medium, 1);
        assert_eq!(bands.low, 1);
        assert_eq!(bands.none, 1);
    }
}
