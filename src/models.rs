//! Core data models used throughout BrandLens.
//!
//! These types represent the prompts, personas, response records, and
//! derived scores that flow through the generation and analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Review state of a generated prompt.
///
/// Starts `Pending`; set by an explicit reviewer action and never reverts
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    Pending,
    Approved,
    Rejected,
}

impl PromptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStatus::Pending => "pending",
            PromptStatus::Approved => "approved",
            PromptStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PromptStatus::Pending),
            "approved" => Some(PromptStatus::Approved),
            "rejected" => Some(PromptStatus::Rejected),
            _ => None,
        }
    }
}

/// Lifecycle state of a generation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Active,
    Archived,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Active => "active",
            BatchStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BatchStatus::Active),
            "archived" => Some(BatchStatus::Archived),
            _ => None,
        }
    }
}

/// A generated test query.
///
/// Created by the generator; mutated only by explicit review actions;
/// never deleted, only archived via its batch.
#[derive(Debug, Clone, Serialize)]
pub struct Prompt {
    pub id: String,
    /// Natural-language text; non-empty after trimming.
    pub text: String,
    pub persona_id: String,
    pub category: String,
    pub intent_type: String,
    /// Heuristic 0–10 estimate set at creation, editable by reviewers.
    pub expected_visibility_score: f64,
    pub batch_id: String,
    pub status: PromptStatus,
}

/// A weighted audience segment used to bias prompt generation.
///
/// Immutable once loaded for a generation run. Weights need not sum to 1;
/// they are normalized at selection time.
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    /// Must be ≥ 0.
    pub weight: f64,
    /// Ordered topical hints, most important first.
    #[serde(default)]
    pub priority_topics: Vec<String>,
}

/// A search-term input with metadata. Generation input only; never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    #[serde(default)]
    pub search_volume: u64,
    pub intent_type: String,
    #[serde(default)]
    pub competitor_brands: Vec<String>,
}

/// A named group of prompts created together.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub batch_id: String,
    pub batch_name: String,
    pub date_added: DateTime<Utc>,
    pub status: BatchStatus,
    pub notes: String,
}

/// One platform's answer to one prompt. Immutable once recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRecord {
    pub prompt_id: String,
    pub platform: String,
    pub response_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Brand lexicon supplied by the caller per analysis run.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandConfig {
    pub brand_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

/// Mention data for a single competitor within one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorMention {
    pub mention_count: usize,
    pub prominence_score: f64,
    pub first_mention_offset: usize,
}

/// The Mention Scorer's output for one response.
///
/// Derived, recomputed deterministically from a [`ResponseRecord`] plus the
/// brand lexicon; never persisted as the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityScore {
    pub brand_mentioned: bool,
    pub brand_mention_count: usize,
    /// 0–10; 0 when the brand is absent.
    pub prominence_score: f64,
    /// Keyed by competitor name; BTreeMap for deterministic iteration.
    pub competitor_details: BTreeMap<String, CompetitorMention>,
    /// Up to 3 substrings around the first brand mentions, display only.
    pub context_snippets: Vec<String>,
}

/// Opportunity tier assigned by the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    QuickWin,
    MediumTerm,
    LongTerm,
}

/// One ranked row in the gap analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    /// Persona, category, or intent-type identifier.
    pub segment: String,
    /// Which grouping pass produced this segment.
    pub dimension: String,
    pub current_visibility_pct: f64,
    pub competitor_avg_pct: f64,
    /// May be negative when the brand is ahead.
    pub gap_points: f64,
    pub sample_size: usize,
    pub impact_score: f64,
    pub tier: Tier,
}
