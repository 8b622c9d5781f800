//! OpenAI-Compatible Client
//!
//! Adapter for providers speaking the chat-completions wire format.
//!
//! # Wire Format
//!
//! - `POST {base_url}/chat/completions` with bearer auth
//! - `mode = json`: `response_format: {"type": "json_object"}`
//! - `mode = tool`: a forced `submit_profile` function call whose arguments
//!   carry the profile
//! - `mode = auto`: plain completion; the system prompt alone constrains
//!   the output shape

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::traits::{decode_profile, ProviderClient};
use crate::generation::{profile_schema, GenerationRequest, GenerationResult, GenerationSettings};
use crate::provider::{ProviderConfig, ResponseMode};

/// Client for OpenAI-compatible providers
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client with the default request timeout
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn chat_url(base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        provider: &ProviderConfig,
        model: &str,
        request: &GenerationRequest,
        settings: &GenerationSettings,
    ) -> anyhow::Result<GenerationResult> {
        let mut body = json!({
            "model": model,
            "temperature": settings.temperature,
            "messages": [
                { "role": "system", "content": settings.system_prompt },
                { "role": "user", "content": settings.user_prompt(request) },
            ],
        });

        match provider.mode {
            ResponseMode::Json => {
                body["response_format"] = json!({ "type": "json_object" });
            }
            ResponseMode::Tool => {
                body["tools"] = json!([{
                    "type": "function",
                    "function": {
                        "name": "submit_profile",
                        "description": "Submit the generated character profile",
                        "parameters": profile_schema(),
                    },
                }]);
                body["tool_choice"] = json!({
                    "type": "function",
                    "function": { "name": "submit_profile" },
                });
            }
            ResponseMode::Auto => {}
        }

        let response = self
            .http_client
            .post(Self::chat_url(&provider.base_url))
            .bearer_auth(&provider.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("provider {} returned {status}: {body}", provider.name);
        }

        let payload: serde_json::Value = response.json().await?;
        let message = &payload["choices"][0]["message"];

        // Tool mode carries the profile in the call arguments, everything
        // else in the message content.
        let content = message["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .or_else(|| message["content"].as_str())
            .ok_or_else(|| {
                anyhow::anyhow!("provider {} returned no message content", provider.name)
            })?;

        decode_profile(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_normalizes_trailing_slash() {
        assert_eq!(
            OpenAiClient::chat_url("https://api.example/v1/"),
            "https://api.example/v1/chat/completions"
        );
        assert_eq!(
            OpenAiClient::chat_url("https://api.example/v1"),
            "https://api.example/v1/chat/completions"
        );
    }
}
