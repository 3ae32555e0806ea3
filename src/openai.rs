//! Text-generation backends.
//!
//! | Provider | Backend | Requires |
//! |----------|---------|----------|
//! | `openai` | [`OpenAIGenerator`] (chat completions) | `OPENAI_API_KEY` |
//! | `disabled` | [`DisabledGenerator`] (every call fails) | nothing |
//!
//! The OpenAI backend works against any OpenAI-compatible server: set
//! `generation.url` to its base URL (without `/chat/completions`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use topicforge_core::generation::{GenerationRequest, TextGenerator};

use crate::config::GenerationConfig;

/// Build the generator selected by `generation.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ OpenAI Provider ============

/// Chat-completions client.
///
/// One request per call, no retries: a failed group is skipped by the
/// caller instead.
pub struct OpenAIGenerator {
    name: String,
    model: String,
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    /// Read `OPENAI_API_KEY` from the environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            bail!("OPENAI_API_KEY environment variable not set");
        }
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            name: format!("openai:{}", config.model),
            model: config.model.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI connection error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;

    if content.trim().is_empty() {
        bail!("Invalid OpenAI response: empty content");
    }
    Ok(content.to_string())
}

// ============ Disabled Provider ============

/// Generator used when `generation.provider = "disabled"`. Every call fails,
/// so every group is skipped.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        bail!("Text generation is disabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "## Executive Summary\nok" } }]
        });
        assert_eq!(
            parse_chat_response(&json).unwrap(),
            "## Executive Summary\nok"
        );
    }

    #[test]
    fn test_parse_rejects_missing_or_empty_content() {
        assert!(parse_chat_response(&serde_json::json!({ "choices": [] })).is_err());
        assert!(parse_chat_response(&serde_json::json!({ "error": "boom" })).is_err());
        let empty = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });
        assert!(parse_chat_response(&empty).is_err());
    }

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let config = GenerationConfig {
            provider: "disabled".to_string(),
            ..Default::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "disabled");
        let request = GenerationRequest {
            system: String::new(),
            prompt: "x".to_string(),
            temperature: 0.7,
            max_tokens: 10,
        };
        assert!(generator.generate(&request).await.is_err());
    }

    #[test]
    fn test_with_api_key_trims_url() {
        let config = GenerationConfig {
            url: "http://127.0.0.1:9999/v1/".to_string(),
            ..Default::default()
        };
        let generator = OpenAIGenerator::with_api_key(&config, "sk-test").unwrap();
        assert_eq!(generator.url, "http://127.0.0.1:9999/v1");
        assert_eq!(generator.name(), "openai:gpt-4.1-2025-04-14");
    }
}
