//! LLM provider abstraction for natural-language prompt variants.
//!
//! Defines the [`TextProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when no LLM is configured.
//! - **[`OpenAIProvider`]** — calls the OpenAI chat completions API with
//!   retry and backoff.
//!
//! The generator treats this module as best-effort: when a call fails, it
//! falls back to template-built prompts rather than aborting the batch.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the appropriate provider based
//! on the configuration:
//!
//! ```rust,no_run
//! # use brandlens::config::LlmConfig;
//! # use brandlens::llm::create_provider;
//! let config = LlmConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! The OpenAI provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::LlmConfig;

/// Trait for text-generation providers.
///
/// The actual completion call is performed by [`complete`] (kept as a
/// free function due to async trait limitations).
pub trait TextProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
}

/// Generate one completion for the given system and user messages.
///
/// Dispatches on the config's `provider` field. The `"disabled"` provider
/// always errors, which callers treat as "use the template fallback".
pub async fn complete(
    _provider: &dyn TextProvider,
    config: &LlmConfig,
    system: &str,
    user: &str,
) -> Result<String> {
    match config.provider.as_str() {
        "openai" => complete_openai(config, system, user).await,
        "disabled" => bail!("LLM provider is disabled"),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A no-op provider that always returns errors.
///
/// Used when `llm.provider = "disabled"` in the configuration.
pub struct DisabledProvider;

impl TextProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
}

// ============ OpenAI Provider ============

/// Chat-completion provider using the OpenAI API.
///
/// Calls the `POST /v1/chat/completions` endpoint with the configured
/// model. Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAIProvider {
    model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set in config, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for OpenAI provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self { model })
    }
}

impl TextProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Call the OpenAI chat completions API with retry/backoff.
async fn complete_openai(config: &LlmConfig, system: &str, user: &str) -> Result<String> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("llm.model required"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "temperature": 0.9,
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_completion(&json);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "OpenAI API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("OpenAI API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Completion failed after retries")))
}

/// Extract the first choice's message content from a chat response.
fn parse_completion(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))?;

    let text = content.trim().trim_matches('"').to_string();
    if text.is_empty() {
        bail!("OpenAI returned an empty completion");
    }
    Ok(text)
}

/// Create the appropriate [`TextProvider`] based on configuration.
///
/// # Supported Providers
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"openai"` | [`OpenAIProvider`] |
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn TextProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_provider_errors() {
        let config = LlmConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "disabled");
        let result = complete(provider.as_ref(), &config, "system", "user").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            ..LlmConfig::default()
        };
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_parse_completion_extracts_content() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  Best eyeshadow primer  " } }
            ]
        });
        assert_eq!(parse_completion(&json).unwrap(), "Best eyeshadow primer");
    }

    #[test]
    fn test_parse_completion_rejects_missing_content() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_completion(&json).is_err());
    }
}
