//! Prompt templates and the builder that fills them.
//!
//! Two template styles per intent type: direct search queries (40%) and
//! conversational questions (60%). Conversational prompts carry no
//! greetings or filler, so the generated text stays close to what a real
//! user would type into an AI assistant.

use rand::Rng;

/// Intent types the template tables know about. Unknown intents fall back
/// to `informational`.
pub const INTENT_TYPES: &[&str] = &[
    "informational",
    "how_to",
    "comparison",
    "problem_solving",
    "recommendation",
    "review",
];

/// Fraction of prompts rendered in the terse search-query style.
const DIRECT_STYLE_RATIO: f64 = 0.4;

/// Chance of appending a priority-topic qualifier to a prompt.
const TOPIC_CONTEXT_RATIO: f64 = 0.15;

/// Chance of framing a prompt in the persona's voice.
const PERSONA_FRAME_RATIO: f64 = 0.3;

/// Prompts longer than this read as unnatural; context additions that
/// cross it are dropped.
const MAX_PROMPT_WORDS: usize = 25;

fn direct_templates(intent_type: &str) -> &'static [&'static str] {
    match intent_type {
        "how_to" => &[
            "How to {keyword}",
            "{keyword} tutorial",
            "{keyword} step by step",
            "Best way to {keyword}",
        ],
        "comparison" => &[
            "{keyword} vs {competitor}",
            "{keyword} compared to {competitor}",
            "{keyword} or {competitor}",
            "Differences between {keyword} and {competitor}",
        ],
        "problem_solving" => &[
            "{keyword} solution",
            "Fix {keyword}",
            "{keyword} not working",
            "Solve {keyword}",
        ],
        "recommendation" => &[
            "Best {keyword}",
            "Top {keyword}",
            "{keyword} recommendations",
            "Which {keyword} to buy",
        ],
        "review" => &[
            "{keyword} review",
            "{keyword} worth it",
            "Is {keyword} good",
            "{keyword} quality",
        ],
        _ => &[
            "Best {keyword}",
            "{keyword} guide",
            "{keyword} explained",
            "Top {keyword} options",
            "{keyword} recommendations",
        ],
    }
}

fn conversational_templates(intent_type: &str) -> &'static [&'static str] {
    match intent_type {
        "how_to" => &[
            "I want to learn how to {keyword}",
            "What's the right way to {keyword}",
            "Need help learning to {keyword}",
            "Trying to figure out how to {keyword}",
        ],
        "comparison" => &[
            "How does {keyword} compare to {competitor}",
            "Should I choose {keyword} or {competitor}",
            "What's the difference between {keyword} and {competitor}",
            "Is {keyword} better than {competitor}",
            "Trying to decide between {keyword} and {competitor}",
        ],
        "problem_solving" => &[
            "I'm having trouble with {keyword}",
            "Need help fixing {keyword}",
            "{keyword} keeps failing, what works better",
            "Struggling with {keyword}, any solutions",
        ],
        "recommendation" => &[
            "Looking for the best {keyword}",
            "I need a good {keyword}",
            "What {keyword} should I get",
            "Need recommendations for {keyword}",
        ],
        "review" => &[
            "Is {keyword} actually worth it",
            "Should I invest in {keyword}",
            "Anyone have experience with {keyword}",
            "Is {keyword} worth the price",
        ],
        _ => &[
            "Looking for information on {keyword}",
            "I need to understand {keyword}",
            "What makes {keyword} different from other options",
            "Can someone explain {keyword}",
            "Trying to learn about {keyword}",
        ],
    }
}

/// Map an intent type to a prompt category for storage and reporting.
pub fn categorize_intent(intent_type: &str) -> &'static str {
    match intent_type {
        "how_to" | "problem_solving" => "technical",
        "comparison" | "recommendation" | "review" => "business",
        _ => "educational",
    }
}

/// Estimate expected visibility (1–10) from keyword characteristics.
///
/// High-volume keywords have more published content to draw on, so the
/// estimate rises with search volume and dips for comparison queries and
/// competitor-anchored prompts.
pub fn estimate_visibility(search_volume: u64, intent_type: &str, has_competitor: bool) -> f64 {
    let mut score: f64 = 7.0;

    if search_volume > 5000 {
        score += 1.5;
    } else if search_volume > 1000 {
        score += 1.0;
    } else if search_volume < 100 {
        score -= 1.0;
    }

    match intent_type {
        "informational" => score += 0.5,
        "comparison" => score -= 0.5,
        _ => {}
    }

    if has_competitor {
        score -= 0.5;
    }

    score.clamp(1.0, 10.0)
}

/// Fills templates from keyword and persona data.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build a prompt from a keyword and intent. Comparison templates are
    /// avoided here since no competitor is available to fill them.
    pub fn basic<R: Rng + ?Sized>(rng: &mut R, keyword: &str, intent_type: &str) -> String {
        let intent = if intent_type == "comparison" {
            "informational"
        } else {
            intent_type
        };

        let templates = if rng.random_bool(DIRECT_STYLE_RATIO) {
            direct_templates(intent)
        } else {
            conversational_templates(intent)
        };
        let template = templates[rng.random_range(0..templates.len())];
        fill(template, keyword, "")
    }

    /// Build a comparison prompt pitting the keyword against a competitor.
    pub fn comparison<R: Rng + ?Sized>(rng: &mut R, keyword: &str, competitor: &str) -> String {
        let templates = if rng.random_bool(DIRECT_STYLE_RATIO) {
            direct_templates("comparison")
        } else {
            conversational_templates("comparison")
        };
        let template = templates[rng.random_range(0..templates.len())];
        fill(template, keyword, competitor)
    }

    /// Build a prompt that occasionally frames the query in the persona's
    /// voice.
    pub fn for_persona<R: Rng + ?Sized>(
        rng: &mut R,
        keyword: &str,
        persona_name: &str,
        intent_type: &str,
    ) -> String {
        let base = Self::basic(rng, keyword, intent_type);

        if rng.random_bool(PERSONA_FRAME_RATIO) {
            let persona = persona_name.to_lowercase();
            if rng.random_bool(0.5) {
                return format!("I'm a {persona}, {}", lowercase_first(&base));
            }
            return format!("{base} - I'm a {persona}");
        }

        base
    }

    /// Occasionally append a priority-topic qualifier, keeping the prompt
    /// under the word limit.
    pub fn with_topic_context<R: Rng + ?Sized>(
        rng: &mut R,
        prompt: String,
        topics: &[String],
    ) -> String {
        if topics.is_empty() || !rng.random_bool(TOPIC_CONTEXT_RATIO) {
            return prompt;
        }

        let topic = &topics[rng.random_range(0..topics.len())];
        let extended = if rng.random_bool(0.5) {
            format!("{prompt} specifically for {topic}")
        } else {
            format!("{prompt} focused on {topic}")
        };

        if extended.split_whitespace().count() > MAX_PROMPT_WORDS {
            return prompt;
        }
        extended
    }
}

fn fill(template: &str, keyword: &str, competitor: &str) -> String {
    template
        .replace("{keyword}", keyword)
        .replace("{competitor}", competitor)
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
