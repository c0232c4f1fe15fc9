//! Brand mention detection and prominence scoring for one AI response.
//!
//! The [`MentionScorer`] is a pure function of (response text, brand +
//! aliases, competitor list): scoring the same response twice yields
//! bit-identical output. No I/O, no mutation of input.
//!
//! # Prominence score (0–10)
//!
//! Applied in order, short-circuiting to 0 when the brand is absent:
//!
//! 1. Base 3.0 for any match.
//! 2. +4.0 if the first match falls within the first 20% of the
//!    response's characters.
//! 3. +1.0 for a second mention, +1.0 more for 3+ (bonus capped at +2.0).
//! 4. −0.5 per distinct competitor also mentioned, floored at −1.5.
//! 5. Clamp to [0, 10].
//!
//! Competitors get the same base/position/mention terms in an independent
//! pass (no competitor-presence penalty of their own).

use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;

use crate::models::{BrandConfig, CompetitorMention, VisibilityScore};

/// Characters kept on each side of a mention when extracting snippets.
const SNIPPET_WINDOW: usize = 80;

/// Maximum number of context snippets per response.
const MAX_SNIPPETS: usize = 3;

/// Scores responses against a fixed brand lexicon.
pub struct MentionScorer {
    brand_patterns: Vec<Regex>,
    competitor_patterns: Vec<(String, Regex)>,
}

impl MentionScorer {
    /// Compile word-boundary patterns for the brand, its aliases, and each
    /// competitor. Blank names are skipped.
    pub fn new(brand: &BrandConfig) -> Result<Self> {
        let mut brand_patterns = Vec::new();
        for name in std::iter::once(&brand.brand_name).chain(brand.aliases.iter()) {
            if let Some(re) = compile_name(name)? {
                brand_patterns.push(re);
            }
        }

        let mut competitor_patterns = Vec::new();
        for name in &brand.competitors {
            if let Some(re) = compile_name(name)? {
                competitor_patterns.push((name.clone(), re));
            }
        }

        Ok(Self {
            brand_patterns,
            competitor_patterns,
        })
    }

    /// Score one response text.
    ///
    /// Empty or whitespace-only text yields a zero score rather than an
    /// error.
    pub fn score(&self, response_text: &str) -> VisibilityScore {
        if response_text.trim().is_empty() {
            return VisibilityScore {
                brand_mentioned: false,
                brand_mention_count: 0,
                prominence_score: 0.0,
                competitor_details: BTreeMap::new(),
                context_snippets: Vec::new(),
            };
        }

        let brand_offsets = find_mentions(response_text, &self.brand_patterns);

        let mut competitor_details = BTreeMap::new();
        for (name, pattern) in &self.competitor_patterns {
            let offsets = find_mentions(response_text, std::slice::from_ref(pattern));
            if let Some(&first) = offsets.first() {
                competitor_details.insert(
                    name.clone(),
                    CompetitorMention {
                        mention_count: offsets.len(),
                        prominence_score: prominence(response_text, &offsets, 0),
                        first_mention_offset: first,
                    },
                );
            }
        }

        let prominence_score =
            prominence(response_text, &brand_offsets, competitor_details.len());

        VisibilityScore {
            brand_mentioned: !brand_offsets.is_empty(),
            brand_mention_count: brand_offsets.len(),
            prominence_score,
            context_snippets: extract_snippets(response_text, &brand_offsets),
            competitor_details,
        }
    }
}

fn compile_name(name: &str) -> Result<Option<Regex>> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b{}\b", regex::escape(trimmed));
    Ok(Some(Regex::new(&pattern)?))
}

/// All match start offsets across the given patterns, ascending.
fn find_mentions(text: &str, patterns: &[Regex]) -> Vec<usize> {
    let mut offsets: Vec<usize> = patterns
        .iter()
        .flat_map(|p| p.find_iter(text).map(|m| m.start()))
        .collect();
    offsets.sort_unstable();
    offsets
}

/// Prominence for one name's byte offsets within `text`.
///
/// The early-position test converts the first offset to a character
/// position, so multibyte text does not shift the 20% boundary.
fn prominence(text: &str, offsets: &[usize], distinct_competitors: usize) -> f64 {
    let first = match offsets.first() {
        Some(&f) => f,
        None => return 0.0,
    };

    let mut score = 3.0;

    let total_chars = text.chars().count();
    if total_chars > 0 {
        let first_char = text[..first].chars().count();
        if (first_char as f64) / (total_chars as f64) < 0.2 {
            score += 4.0;
        }
    }

    score += match offsets.len() {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => 2.0,
    };

    score -= 0.5 * distinct_competitors.min(3) as f64;

    score.clamp(0.0, 10.0)
}

/// Extract up to [`MAX_SNIPPETS`] windows around the first mention offsets.
fn extract_snippets(text: &str, offsets: &[usize]) -> Vec<String> {
    offsets
        .iter()
        .take(MAX_SNIPPETS)
        .map(|&pos| {
            let start = snap_to_char_boundary(text, pos.saturating_sub(SNIPPET_WINDOW));
            let end = snap_to_char_boundary(text, (pos + SNIPPET_WINDOW).min(text.len()));
            format!("...{}...", text[start..end].trim())
        })
        .collect()
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(competitors: &[&str]) -> BrandConfig {
        BrandConfig {
            brand_name: "Natasha Denona".to_string(),
            aliases: vec![],
            competitors: competitors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_early_mention_with_one_competitor() {
        let scorer = MentionScorer::new(&brand(&["Charlotte Tilbury"])).unwrap();
        let text = "I love Natasha Denona palettes, though Charlotte Tilbury is also nice.";
        let score = scorer.score(text);

        assert!(score.brand_mentioned);
        assert_eq!(score.brand_mention_count, 1);
        // Offset 7, within the first 20%: 3.0 + 4.0 − 0.5.
        assert!((score.prominence_score - 6.5).abs() < 1e-9);
        let comp = &score.competitor_details["Charlotte Tilbury"];
        assert_eq!(comp.mention_count, 1);
        assert_eq!(comp.first_mention_offset, text.find("Charlotte").unwrap());
    }

    #[test]
    fn test_empty_response_scores_zero() {
        let scorer = MentionScorer::new(&brand(&["Charlotte Tilbury"])).unwrap();
        for text in ["", "   \n\t "] {
            let score = scorer.score(text);
            assert!(!score.brand_mentioned);
            assert_eq!(score.prominence_score, 0.0);
            assert!(score.competitor_details.is_empty());
            assert!(score.context_snippets.is_empty());
        }
    }

    #[test]
    fn test_deterministic() {
        let scorer = MentionScorer::new(&brand(&["Charlotte Tilbury", "MAC"])).unwrap();
        let text = "Natasha Denona and MAC both make great palettes. Natasha Denona wins.";
        assert_eq!(scorer.score(text), scorer.score(text));
    }

    #[test]
    fn test_no_mention_short_circuits() {
        let scorer = MentionScorer::new(&brand(&["Charlotte Tilbury"])).unwrap();
        let score = scorer.score("Charlotte Tilbury makes the best palettes by far.");
        assert!(!score.brand_mentioned);
        assert_eq!(score.prominence_score, 0.0);
        // Competitor details are still populated independently.
        assert_eq!(score.competitor_details["Charlotte Tilbury"].mention_count, 1);
    }

    #[test]
    fn test_word_boundary_matching() {
        let scorer = MentionScorer::new(&BrandConfig {
            brand_name: "MAC".to_string(),
            aliases: vec![],
            competitors: vec![],
        })
        .unwrap();
        assert!(!scorer.score("The machine whirred along.").brand_mentioned);
        assert!(scorer.score("I bought a mac lipstick.").brand_mentioned);
    }

    #[test]
    fn test_alias_counts_as_brand_mention() {
        let scorer = MentionScorer::new(&BrandConfig {
            brand_name: "Natasha Denona".to_string(),
            aliases: vec!["ND".to_string()],
            competitors: vec![],
        })
        .unwrap();
        let score = scorer.score("The ND Bronze palette is stunning.");
        assert!(score.brand_mentioned);
        assert_eq!(score.brand_mention_count, 1);
    }

    #[test]
    fn test_mention_bonus_caps_at_two() {
        let scorer = MentionScorer::new(&brand(&[])).unwrap();
        let filler = "Other brands come and go. ".repeat(30);
        let text = format!(
            "{filler}Natasha Denona here. Natasha Denona again. Natasha Denona once more. \
             Natasha Denona a fourth time."
        );
        let score = scorer.score(&text);
        // Late first mention: base 3.0 + capped bonus 2.0.
        assert!((score.prominence_score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_competitor_penalty_floors_at_minus_1_5() {
        let scorer = MentionScorer::new(&brand(&[
            "Charlotte Tilbury",
            "Pat McGrath Labs",
            "Urban Decay",
            "MAC",
        ]))
        .unwrap();
        let filler = "Plenty of preamble before anyone gets named in this response. ".repeat(5);
        let text = format!(
            "{filler}Natasha Denona competes with Charlotte Tilbury, Pat McGrath Labs, \
             Urban Decay, and MAC."
        );
        let score = scorer.score(&text);
        assert_eq!(score.competitor_details.len(), 4);
        // Base 3.0 − 1.5 floor; first mention is past the 20% mark.
        assert!((score.prominence_score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds_hold() {
        let scorer = MentionScorer::new(&brand(&["Charlotte Tilbury"])).unwrap();
        let texts = [
            "Natasha Denona ".repeat(50),
            "Charlotte Tilbury ".repeat(50),
            "Natasha Denona".to_string(),
            "x".repeat(10_000),
        ];
        for text in &texts {
            let s = scorer.score(text);
            assert!((0.0..=10.0).contains(&s.prominence_score), "{}", s.prominence_score);
            for comp in s.competitor_details.values() {
                assert!((0.0..=10.0).contains(&comp.prominence_score));
            }
        }
    }

    #[test]
    fn test_snippets_limited_and_centered() {
        let scorer = MentionScorer::new(&brand(&[])).unwrap();
        let text = "Natasha Denona one. Natasha Denona two. Natasha Denona three. \
                    Natasha Denona four.";
        let score = scorer.score(text);
        assert_eq!(score.context_snippets.len(), 3);
        for snippet in &score.context_snippets {
            assert!(snippet.contains("Natasha Denona"));
        }
    }

    #[test]
    fn test_position_bonus_counts_characters_not_bytes() {
        let scorer = MentionScorer::new(&brand(&[])).unwrap();
        // Fifteen three-byte characters push the mention past 20% of the
        // bytes while leaving it within the first 20% of the characters.
        let text = format!("{} Natasha Denona {}", "日".repeat(15), "x ".repeat(45));
        let score = scorer.score(&text);
        assert!(score.brand_mentioned);
        // Base 3.0 + early-position 4.0, single mention, no competitors.
        assert!((score.prominence_score - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_multibyte_snippet_boundaries() {
        let scorer = MentionScorer::new(&brand(&[])).unwrap();
        let text = format!("{}Natasha Denona éclat{}", "é".repeat(90), "è".repeat(90));
        // Must not panic on non-ASCII boundaries.
        let score = scorer.score(&text);
        assert!(score.brand_mentioned);
        assert_eq!(score.context_snippets.len(), 1);
    }
}
