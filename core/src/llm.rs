//! LLM provider abstraction, narrowed to a single Anthropic Messages API
//! provider plus a scripted test double.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{EngineError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A single prompt-completion call against an LLM backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Talks to the Anthropic Messages API over HTTPS.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl HttpLlmProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [AnthropicMessage { role: "user", content: prompt }],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(DEFAULT_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::LlmTimeout(DEFAULT_TIMEOUT)
                } else {
                    EngineError::LlmUnavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::LlmUnavailable(format!(
                "provider returned {status}: {body}"
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| EngineError::LlmMalformedResponse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .next()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                EngineError::LlmMalformedResponse("response had no content blocks".to_string())
            })
    }
}

/// Test double that returns a fixed or templated completion without any
/// network activity.
pub struct StubLlmProvider {
    pub response: String,
}

impl StubLlmProvider {
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlmProvider {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_provider_echoes_fixed_response() {
        let provider = StubLlmProvider::fixed("hello");
        let out = provider.complete("anything").await.unwrap();
        assert_eq!(out, "hello");
    }
}
