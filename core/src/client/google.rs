//! Google-Compatible Client
//!
//! Adapter for providers speaking the generateContent wire format.
//!
//! # Wire Format
//!
//! - `POST {base_url}/models/{model}:generateContent?key={api_key}`
//! - Structured output is requested through `generationConfig` with
//!   `responseMimeType: application/json` and a response schema, so the
//!   `mode` hint changes nothing for this family
//! - The profile text arrives at `candidates[0].content.parts[0].text`

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::traits::{decode_profile, ProviderClient};
use crate::generation::{profile_schema, GenerationRequest, GenerationResult, GenerationSettings};
use crate::provider::ProviderConfig;

/// Client for Google-compatible providers
#[derive(Clone)]
pub struct GoogleClient {
    http_client: reqwest::Client,
}

impl GoogleClient {
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

    fn generate_url(base_url: &str, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            base_url.trim_end_matches('/')
        )
    }
}

impl Default for GoogleClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for GoogleClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn generate(
        &self,
        provider: &ProviderConfig,
        model: &str,
        request: &GenerationRequest,
        settings: &GenerationSettings,
    ) -> anyhow::Result<GenerationResult> {
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": settings.system_prompt }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": settings.user_prompt(request) }],
            }],
            "generationConfig": {
                "temperature": settings.temperature,
                "responseMimeType": "application/json",
                "responseSchema": profile_schema(),
            },
        });

        let response = self
            .http_client
            .post(Self::generate_url(&provider.base_url, model))
            .query(&[("key", provider.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("provider {} returned {status}: {body}", provider.name);
        }

        let payload: serde_json::Value = response.json().await?;
        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                anyhow::anyhow!("provider {} returned no candidates", provider.name)
            })?;

        decode_profile(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url_includes_model() {
        assert_eq!(
            GoogleClient::generate_url("https://gen.example/v1beta/", "gemini-2.5-flash"),
            "https://gen.example/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
