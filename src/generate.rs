//! Prompt generation engine.
//!
//! Distributes a requested prompt count across personas by weight, fills
//! each slot from keyword data through the template builder (or an LLM
//! variant when one is configured), and screens every candidate through
//! the [`SimilarityIndex`] before accepting it. A slot whose retry budget
//! runs out is recorded as a shortfall rather than an error, so a batch
//! always returns the prompts it managed to produce.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::config::{GenerationConfig, LlmConfig};
use crate::dedup::{DedupMode, DedupStats, SimilarityIndex};
use crate::error::{Error, Result};
use crate::llm::{self, TextProvider};
use crate::models::{KeywordRecord, Persona, Prompt, PromptStatus};
use crate::templates::{categorize_intent, estimate_visibility, PromptBuilder};

/// Fraction of slots drawn from the persona's priority topics rather than
/// the full keyword pool.
const PRIORITY_TOPIC_RATIO: f64 = 0.6;

/// Outcome of one generation run. `accepted` can fall short of
/// `requested` when dedup retries are exhausted; that shortfall is data,
/// not an error.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub prompts: Vec<Prompt>,
    pub requested: usize,
    pub accepted: usize,
    pub duplicates_rejected: usize,
    /// Slots abandoned after the per-slot retry budget ran out.
    pub exhausted_slots: usize,
    pub with_competitors: usize,
    pub llm_generated: usize,
    pub by_persona: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_intent: BTreeMap<String, usize>,
    pub dedup_stats: DedupStats,
}

/// Weighted prompt generator over a fixed persona and keyword pool.
#[derive(Debug)]
pub struct PromptGenerator {
    personas: Vec<Persona>,
    keywords: Vec<KeywordRecord>,
    config: GenerationConfig,
    rng: StdRng,
}

impl PromptGenerator {
    /// Validate the input pools and build a generator.
    ///
    /// The RNG is seeded from `generation.seed` when present, so a seeded
    /// run with an LLM disabled is fully reproducible.
    pub fn new(
        personas: Vec<Persona>,
        keywords: Vec<KeywordRecord>,
        config: GenerationConfig,
    ) -> Result<Self> {
        if personas.is_empty() {
            return Err(Error::Configuration("persona list is empty".to_string()));
        }
        let total_weight: f64 = personas.iter().map(|p| p.weight.max(0.0)).sum();
        if total_weight <= 0.0 {
            return Err(Error::Configuration(
                "persona weights must include at least one positive weight".to_string(),
            ));
        }
        if keywords.is_empty() {
            return Err(Error::Configuration("keyword list is empty".to_string()));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            personas,
            keywords,
            config,
            rng,
        })
    }

    /// Split `count` prompts across personas proportionally to weight.
    ///
    /// Floors each share and hands the rounding remainder to the
    /// heaviest persona, so the counts always sum to `count`.
    pub fn persona_distribution(&self, count: usize) -> Vec<(usize, usize)> {
        let total_weight: f64 = self.personas.iter().map(|p| p.weight.max(0.0)).sum();

        let mut order: Vec<usize> = (0..self.personas.len()).collect();
        order.sort_by(|&a, &b| {
            self.personas[b]
                .weight
                .partial_cmp(&self.personas[a].weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.personas[a].id.cmp(&self.personas[b].id))
        });

        let mut distribution = Vec::with_capacity(order.len());
        let mut assigned = 0usize;
        for &idx in order.iter().skip(1).rev() {
            let share = self.personas[idx].weight.max(0.0) / total_weight;
            let slots = (count as f64 * share) as usize;
            distribution.push((idx, slots));
            assigned += slots;
        }
        // Heaviest persona absorbs the remainder.
        distribution.push((order[0], count - assigned));
        distribution.reverse();
        distribution
    }

    /// Generate `count` prompts, screening each candidate through `index`.
    ///
    /// `provider` is consulted for roughly `llm_ratio` of the slots when
    /// enabled; any LLM failure falls back to the template builder.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `count` is zero. Pool problems were
    /// already rejected in [`PromptGenerator::new`].
    pub async fn generate(
        &mut self,
        count: usize,
        batch_id: &str,
        index: &mut SimilarityIndex,
        provider: Option<(&dyn TextProvider, &LlmConfig)>,
    ) -> Result<GenerationOutcome> {
        if count == 0 {
            return Err(Error::InvalidArgument(
                "prompt count must be at least 1".to_string(),
            ));
        }

        let mode = DedupMode::parse(&self.config.dedup_mode).ok_or_else(|| {
            Error::Configuration(format!("unknown dedup mode: {}", self.config.dedup_mode))
        })?;

        let mut outcome = GenerationOutcome {
            prompts: Vec::with_capacity(count),
            requested: count,
            accepted: 0,
            duplicates_rejected: 0,
            exhausted_slots: 0,
            with_competitors: 0,
            llm_generated: 0,
            by_persona: BTreeMap::new(),
            by_category: BTreeMap::new(),
            by_intent: BTreeMap::new(),
            dedup_stats: DedupStats::default(),
        };

        let distribution = self.persona_distribution(count);
        let has_competitor_keywords = self.keywords.iter().any(|k| !k.competitor_brands.is_empty());

        for (persona_idx, slots) in distribution {
            let persona = self.personas[persona_idx].clone();
            let competitor_slots = (slots as f64 * self.config.competitor_ratio) as usize;

            for slot in 0..slots {
                let include_competitor = slot < competitor_slots && has_competitor_keywords;

                match self
                    .fill_slot(&persona, include_competitor, batch_id, index, mode, provider)
                    .await
                {
                    SlotResult::Accepted {
                        prompt,
                        rejected,
                        used_llm,
                    } => {
                        outcome.duplicates_rejected += rejected;
                        if include_competitor {
                            outcome.with_competitors += 1;
                        }
                        if used_llm {
                            outcome.llm_generated += 1;
                        }
                        *outcome.by_persona.entry(persona.name.clone()).or_insert(0) += 1;
                        *outcome
                            .by_category
                            .entry(prompt.category.clone())
                            .or_insert(0) += 1;
                        *outcome
                            .by_intent
                            .entry(prompt.intent_type.clone())
                            .or_insert(0) += 1;
                        outcome.prompts.push(prompt);
                    }
                    SlotResult::Exhausted { rejected } => {
                        outcome.duplicates_rejected += rejected;
                        outcome.exhausted_slots += 1;
                    }
                }
            }
        }

        outcome.accepted = outcome.prompts.len();
        outcome.dedup_stats = index.stats();
        Ok(outcome)
    }

    /// Produce one accepted prompt for a slot, or give up after the retry
    /// budget.
    async fn fill_slot(
        &mut self,
        persona: &Persona,
        include_competitor: bool,
        batch_id: &str,
        index: &mut SimilarityIndex,
        mode: DedupMode,
        provider: Option<(&dyn TextProvider, &LlmConfig)>,
    ) -> SlotResult {
        let mut rejected = 0usize;
        let attempts = 1 + self.config.max_retries_per_slot as usize;

        for _ in 0..attempts {
            let keyword = self.pick_keyword(persona, include_competitor).clone();
            let (text, used_llm) = self
                .render_prompt(persona, &keyword, include_competitor, provider)
                .await;

            if index.is_duplicate(&text, mode) {
                rejected += 1;
                continue;
            }
            index.insert(&text);

            let category = categorize_intent(&keyword.intent_type).to_string();
            let expected = estimate_visibility(
                keyword.search_volume,
                &keyword.intent_type,
                include_competitor,
            );

            return SlotResult::Accepted {
                prompt: Prompt {
                    id: format!("gen_{}", Uuid::new_v4().simple()),
                    text,
                    persona_id: persona.id.clone(),
                    category,
                    intent_type: keyword.intent_type.clone(),
                    expected_visibility_score: (expected * 10.0).round() / 10.0,
                    batch_id: batch_id.to_string(),
                    status: PromptStatus::Pending,
                },
                rejected,
                used_llm,
            };
        }

        SlotResult::Exhausted { rejected }
    }

    /// Pick a keyword, preferring the persona's priority topics 60% of
    /// the time; competitor slots draw only from keywords that name one.
    fn pick_keyword(&mut self, persona: &Persona, include_competitor: bool) -> &KeywordRecord {
        let pool: Vec<usize> = if include_competitor {
            (0..self.keywords.len())
                .filter(|&i| !self.keywords[i].competitor_brands.is_empty())
                .collect()
        } else if !persona.priority_topics.is_empty() && self.rng.random_bool(PRIORITY_TOPIC_RATIO)
        {
            let topical: Vec<usize> = (0..self.keywords.len())
                .filter(|&i| {
                    let kw = self.keywords[i].keyword.to_lowercase();
                    persona
                        .priority_topics
                        .iter()
                        .any(|t| kw.contains(&t.to_lowercase()))
                })
                .collect();
            if topical.is_empty() {
                (0..self.keywords.len()).collect()
            } else {
                topical
            }
        } else {
            (0..self.keywords.len()).collect()
        };

        let idx = pool[self.rng.random_range(0..pool.len())];
        &self.keywords[idx]
    }

    /// Draw one competitor name from the keyword uniformly at random.
    fn pick_competitor(&mut self, keyword: &KeywordRecord) -> Option<String> {
        if keyword.competitor_brands.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..keyword.competitor_brands.len());
        Some(keyword.competitor_brands[idx].clone())
    }

    /// Render the prompt text for one attempt.
    async fn render_prompt(
        &mut self,
        persona: &Persona,
        keyword: &KeywordRecord,
        include_competitor: bool,
        provider: Option<(&dyn TextProvider, &LlmConfig)>,
    ) -> (String, bool) {
        if let Some((provider, llm_config)) = provider {
            if llm_config.is_enabled() && self.rng.random_bool(self.config.llm_ratio) {
                let competitor = if include_competitor {
                    self.pick_competitor(keyword)
                } else {
                    None
                };
                let user = llm_request(persona, &keyword.keyword, &keyword.intent_type, &competitor);
                match llm::complete(provider, llm_config, LLM_SYSTEM_PROMPT, &user).await {
                    Ok(text) => return (text, true),
                    Err(_) => {
                        // Fall through to templates; the batch must not
                        // abort on a flaky provider.
                    }
                }
            }
        }

        (
            self.template_prompt(persona, keyword, include_competitor),
            false,
        )
    }

    fn template_prompt(
        &mut self,
        persona: &Persona,
        keyword: &KeywordRecord,
        include_competitor: bool,
    ) -> String {
        let competitor = if include_competitor {
            self.pick_competitor(keyword)
        } else {
            None
        };
        let base = if let Some(name) = competitor {
            PromptBuilder::comparison(&mut self.rng, &keyword.keyword, &name)
        } else {
            PromptBuilder::for_persona(
                &mut self.rng,
                &keyword.keyword,
                &persona.name,
                &keyword.intent_type,
            )
        };

        PromptBuilder::with_topic_context(&mut self.rng, base, &persona.priority_topics)
    }
}

enum SlotResult {
    Accepted {
        prompt: Prompt,
        rejected: usize,
        used_llm: bool,
    },
    Exhausted {
        rejected: usize,
    },
}

const LLM_SYSTEM_PROMPT: &str = "Generate a clean, direct search query that someone would type \
into a search engine or AI assistant. No greetings, no pleasantries, no conversational filler. \
Vary the structure; not all queries should be questions. Keep it to one or two sentences. \
Return only the query text, nothing else.";

fn llm_request(
    persona: &Persona,
    keyword: &str,
    intent_type: &str,
    competitor: &Option<String>,
) -> String {
    let mut request = format!(
        "Persona: {}\nKeyword/Topic: {}\nIntent: {}",
        persona.name, keyword, intent_type
    );
    if let Some(name) = competitor {
        request.push_str(&format!(
            "\nInclude a natural comparison or mention of '{name}'."
        ));
    }
    request
}

/// Load personas from a JSON file shaped `{ "personas": [...] }`.
pub fn load_personas(path: &Path) -> anyhow::Result<Vec<Persona>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read personas file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| "Failed to parse personas file")?;
    let personas = value
        .get("personas")
        .cloned()
        .unwrap_or(serde_json::Value::Array(Vec::new()));
    serde_json::from_value(personas).with_context(|| "Invalid persona entry")
}

/// Load keyword records from a JSON file shaped `{ "keywords": [...] }`.
pub fn load_keywords(path: &Path) -> anyhow::Result<Vec<KeywordRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keywords file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| "Failed to parse keywords file")?;
    let keywords = value
        .get("keywords")
        .cloned()
        .unwrap_or(serde_json::Value::Array(Vec::new()));
    serde_json::from_value(keywords).with_context(|| "Invalid keyword entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona(id: &str, weight: f64, topics: &[&str]) -> Persona {
        Persona {
            id: id.to_string(),
            name: id.replace('_', " "),
            weight,
            priority_topics: topics.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn keyword(text: &str, intent: &str, competitors: &[&str]) -> KeywordRecord {
        KeywordRecord {
            keyword: text.to_string(),
            search_volume: 1500,
            intent_type: intent.to_string(),
            competitor_brands: competitors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn seeded_config() -> GenerationConfig {
        GenerationConfig {
            seed: Some(42),
            ..GenerationConfig::default()
        }
    }

    fn sample_keywords() -> Vec<KeywordRecord> {
        vec![
            keyword("luxury eyeshadow palette", "informational", &["Charlotte Tilbury"]),
            keyword("eyeshadow for hooded eyes", "recommendation", &[]),
            keyword("apply eyeshadow primer", "how_to", &["Urban Decay"]),
            keyword("eyeshadow palette quality", "review", &[]),
            keyword("long lasting eyeshadow", "problem_solving", &["MAC"]),
        ]
    }

    #[test]
    fn test_empty_personas_is_configuration_error() {
        let err = PromptGenerator::new(vec![], sample_keywords(), seeded_config()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_zero_weights_is_configuration_error() {
        let personas = vec![persona("a", 0.0, &[]), persona("b", 0.0, &[])];
        let err = PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_empty_keywords_is_configuration_error() {
        let personas = vec![persona("a", 1.0, &[])];
        let err = PromptGenerator::new(personas, vec![], seeded_config()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_zero_count_is_invalid_argument() {
        let personas = vec![persona("a", 1.0, &[])];
        let mut generator =
            PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);
        let err = generator
            .generate(0, "batch-1", &mut index, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_distribution_sums_to_count_and_follows_weights() {
        let personas = vec![
            persona("enthusiast", 0.5, &[]),
            persona("artist", 0.3, &[]),
            persona("beginner", 0.2, &[]),
        ];
        let generator =
            PromptGenerator::new(personas.clone(), sample_keywords(), seeded_config()).unwrap();
        let distribution = generator.persona_distribution(100);

        let total: usize = distribution.iter().map(|&(_, n)| n).sum();
        assert_eq!(total, 100);

        let by_id: BTreeMap<&str, usize> = distribution
            .iter()
            .map(|&(idx, n)| (personas[idx].id.as_str(), n))
            .collect();
        assert_eq!(by_id["artist"], 30);
        assert_eq!(by_id["beginner"], 20);
        assert_eq!(by_id["enthusiast"], 50);
    }

    #[test]
    fn test_distribution_remainder_goes_to_heaviest() {
        let personas = vec![persona("big", 0.7, &[]), persona("small", 0.3, &[])];
        let generator =
            PromptGenerator::new(personas.clone(), sample_keywords(), seeded_config()).unwrap();
        // 10 * 0.3 = 3 to "small", 7 to "big" via remainder.
        let distribution = generator.persona_distribution(10);
        let total: usize = distribution.iter().map(|&(_, n)| n).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_competitor_pick_covers_whole_list() {
        let personas = vec![persona("a", 1.0, &[])];
        let mut generator =
            PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
        let kw = keyword(
            "best eyeshadow palette",
            "comparison",
            &["Charlotte Tilbury", "Pat McGrath Labs", "Urban Decay"],
        );

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(generator.pick_competitor(&kw).unwrap());
        }
        // Uniform draws reach every name, not just the first entry.
        assert_eq!(seen.len(), 3);

        let bare = keyword("solo keyword", "review", &[]);
        assert_eq!(generator.pick_competitor(&bare), None);
    }

    #[tokio::test]
    async fn test_generate_fills_requested_count() {
        let personas = vec![
            persona("luxury_enthusiast", 0.6, &["eyeshadow"]),
            persona("beginner", 0.4, &[]),
        ];
        let mut generator =
            PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);

        let outcome = generator
            .generate(20, "batch-1", &mut index, None)
            .await
            .unwrap();

        assert_eq!(outcome.requested, 20);
        assert_eq!(outcome.accepted + outcome.exhausted_slots, 20);
        assert_eq!(outcome.prompts.len(), outcome.accepted);
        for prompt in &outcome.prompts {
            assert!(!prompt.text.is_empty());
            assert_eq!(prompt.batch_id, "batch-1");
            assert_eq!(prompt.status, PromptStatus::Pending);
            assert!((1.0..=10.0).contains(&prompt.expected_visibility_score));
        }
    }

    #[tokio::test]
    async fn test_generated_prompts_pass_their_own_dedup() {
        let personas = vec![persona("enthusiast", 1.0, &[])];
        let mut generator =
            PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);

        let outcome = generator
            .generate(15, "batch-1", &mut index, None)
            .await
            .unwrap();

        // Replaying the accepted texts through a fresh index must not
        // flag any of them: the batch is mutually distinct.
        let mut fresh = SimilarityIndex::new(0.90, 0.75);
        for prompt in &outcome.prompts {
            assert!(
                !fresh.is_duplicate(&prompt.text, DedupMode::HighSimilarity),
                "accepted prompt collides: {}",
                prompt.text
            );
            fresh.insert(&prompt.text);
        }
    }

    #[tokio::test]
    async fn test_tiny_keyword_pool_yields_partial_batch() {
        // One keyword cannot support 50 distinct prompts; the run must
        // stop retrying per slot and report the shortfall.
        let personas = vec![persona("enthusiast", 1.0, &[])];
        let keywords = vec![keyword("luxury eyeshadow palette", "informational", &[])];
        let mut generator = PromptGenerator::new(personas, keywords, seeded_config()).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);

        let outcome = generator
            .generate(50, "batch-1", &mut index, None)
            .await
            .unwrap();

        assert!(outcome.accepted < 50);
        assert!(outcome.exhausted_slots > 0);
        assert!(outcome.duplicates_rejected > 0);
        assert_eq!(outcome.accepted + outcome.exhausted_slots, 50);
    }

    #[tokio::test]
    async fn test_competitor_slots_reference_competitors() {
        let personas = vec![persona("enthusiast", 1.0, &[])];
        let config = GenerationConfig {
            competitor_ratio: 1.0,
            seed: Some(7),
            ..GenerationConfig::default()
        };
        let mut generator = PromptGenerator::new(personas, sample_keywords(), config).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);

        let outcome = generator
            .generate(10, "batch-1", &mut index, None)
            .await
            .unwrap();

        assert_eq!(outcome.with_competitors, outcome.accepted);
        let names = ["Charlotte Tilbury", "Urban Decay", "MAC"];
        for prompt in &outcome.prompts {
            assert!(
                names.iter().any(|n| prompt.text.contains(n)),
                "no competitor in: {}",
                prompt.text
            );
        }
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let run = || async {
            let personas = vec![persona("enthusiast", 0.7, &[]), persona("beginner", 0.3, &[])];
            let mut generator =
                PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
            let mut index = SimilarityIndex::new(0.90, 0.75);
            let outcome = generator
                .generate(12, "batch-1", &mut index, None)
                .await
                .unwrap();
            outcome
                .prompts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
        };
        assert_eq!(run().await, run().await);
    }

    #[tokio::test]
    async fn test_stats_partition_accepted_prompts() {
        let personas = vec![persona("enthusiast", 0.5, &[]), persona("beginner", 0.5, &[])];
        let mut generator =
            PromptGenerator::new(personas, sample_keywords(), seeded_config()).unwrap();
        let mut index = SimilarityIndex::new(0.90, 0.75);

        let outcome = generator
            .generate(16, "batch-1", &mut index, None)
            .await
            .unwrap();

        assert_eq!(outcome.by_persona.values().sum::<usize>(), outcome.accepted);
        assert_eq!(outcome.by_category.values().sum::<usize>(), outcome.accepted);
        assert_eq!(outcome.by_intent.values().sum::<usize>(), outcome.accepted);
    }
}
