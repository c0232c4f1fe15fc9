use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::BrandConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub brand: BrandConfig,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Paths to the generation input files (JSON).
#[derive(Debug, Deserialize, Clone)]
pub struct InputsConfig {
    pub personas_file: PathBuf,
    pub keywords_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Fraction of prompts that must reference a competitor brand.
    #[serde(default = "default_competitor_ratio")]
    pub competitor_ratio: f64,
    /// Duplicate detection mode: disabled, exact, high_similarity, or fuzzy.
    #[serde(default = "default_dedup_mode")]
    pub dedup_mode: String,
    #[serde(default = "default_high_similarity_threshold")]
    pub high_similarity_threshold: f64,
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Regeneration attempts per slot before recording a shortfall.
    #[serde(default = "default_max_retries_per_slot")]
    pub max_retries_per_slot: u32,
    /// Fraction of slots that ask the LLM for a natural-language variant
    /// (when an LLM provider is configured).
    #[serde(default = "default_llm_ratio")]
    pub llm_ratio: f64,
    /// RNG seed for reproducible runs. Absent = seeded from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            competitor_ratio: default_competitor_ratio(),
            dedup_mode: default_dedup_mode(),
            high_similarity_threshold: default_high_similarity_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            max_retries_per_slot: default_max_retries_per_slot(),
            llm_ratio: default_llm_ratio(),
            seed: None,
        }
    }
}

fn default_competitor_ratio() -> f64 {
    0.3
}
fn default_dedup_mode() -> String {
    "high_similarity".to_string()
}
fn default_high_similarity_threshold() -> f64 {
    0.90
}
fn default_fuzzy_threshold() -> f64 {
    0.75
}
fn default_max_retries_per_slot() -> u32 {
    10
}
fn default_llm_ratio() -> f64 {
    0.7
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    /// Segments eligible for the quick-win tier.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Sample sizes below this count as "small" for quick-win tiering.
    #[serde(default = "default_small_sample_threshold")]
    pub small_sample_threshold: usize,
    /// Minimum gap (percentage points) for quick_win / medium_term.
    #[serde(default = "default_min_gap_points")]
    pub min_gap_points: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            small_sample_threshold: default_small_sample_threshold(),
            min_gap_points: default_min_gap_points(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_small_sample_threshold() -> usize {
    30
}
fn default_min_gap_points() -> f64 {
    15.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate brand
    if config.brand.brand_name.trim().is_empty() {
        anyhow::bail!("brand.brand_name must not be empty");
    }

    // Validate generation
    if !(0.0..=1.0).contains(&config.generation.competitor_ratio) {
        anyhow::bail!("generation.competitor_ratio must be in [0.0, 1.0]");
    }

    if !(0.0..=1.0).contains(&config.generation.llm_ratio) {
        anyhow::bail!("generation.llm_ratio must be in [0.0, 1.0]");
    }

    for (name, value) in [
        (
            "generation.high_similarity_threshold",
            config.generation.high_similarity_threshold,
        ),
        (
            "generation.fuzzy_threshold",
            config.generation.fuzzy_threshold,
        ),
    ] {
        if !(0.0 < value && value <= 1.0) {
            anyhow::bail!("{} must be in (0.0, 1.0]", name);
        }
    }

    match config.generation.dedup_mode.as_str() {
        "disabled" | "exact" | "high_similarity" | "fuzzy" => {}
        other => anyhow::bail!(
            "Unknown dedup mode: '{}'. Must be disabled, exact, high_similarity, or fuzzy.",
            other
        ),
    }

    // Validate ranking
    if config.ranking.top_k < 1 {
        anyhow::bail!("ranking.top_k must be >= 1");
    }

    // Validate LLM
    if config.llm.is_enabled() && config.llm.model.is_none() {
        anyhow::bail!(
            "llm.model must be specified when provider is '{}'",
            config.llm.provider
        );
    }

    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown LLM provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    const MINIMAL: &str = r#"
[db]
path = "blens.db"

[brand]
brand_name = "Natasha Denona"
competitors = ["Charlotte Tilbury", "Pat McGrath Labs"]

[inputs]
personas_file = "personas.json"
keywords_file = "keywords.json"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let f = write_config(MINIMAL);
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.generation.dedup_mode, "high_similarity");
        assert!((cfg.generation.competitor_ratio - 0.3).abs() < 1e-9);
        assert_eq!(cfg.generation.max_retries_per_slot, 10);
        assert_eq!(cfg.ranking.top_k, 3);
        assert_eq!(cfg.ranking.small_sample_threshold, 30);
        assert!(!cfg.llm.is_enabled());
    }

    #[test]
    fn test_empty_brand_name_rejected() {
        let body = MINIMAL.replace("Natasha Denona", "  ");
        let f = write_config(&body);
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_bad_dedup_mode_rejected() {
        let body = format!("{MINIMAL}\n[generation]\ndedup_mode = \"semantic\"\n");
        let f = write_config(&body);
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let body = format!("{MINIMAL}\n[generation]\ncompetitor_ratio = 1.5\n");
        let f = write_config(&body);
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_llm_requires_model() {
        let body = format!("{MINIMAL}\n[llm]\nprovider = \"openai\"\n");
        let f = write_config(&body);
        assert!(load_config(f.path()).is_err());
    }
}
