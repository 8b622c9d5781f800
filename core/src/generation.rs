//! Character Profile Generation
//!
//! Request/result types and the [`Generator`], the caller-side layer above
//! the provider selector. The selector only picks a provider; this module
//! executes everything the chosen provider's configuration promises:
//! skip rolls (`skip_probability`), the model fallback chain, and the retry
//! budget (`retry_count`) with jittered exponential backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{GoogleClient, OpenAiClient, ProviderClient};
use crate::config::AppConfig;
use crate::error::GenerationError;
use crate::provider::{
    ProviderConfig, ProviderKind, ProviderSelector, SelectionMetrics, SelectionStrategy,
};

// ============================================================================
// Request and Result Types
// ============================================================================

/// A character generation request
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Unique request ID
    pub request_id: String,
    /// The real name seeding the character design
    pub seed_name: String,
    /// Free-form user preferences forwarded to the provider
    pub preferences: Option<String>,
}

impl GenerationRequest {
    /// Create a request for a seed name
    pub fn new(seed_name: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            seed_name: seed_name.into(),
            preferences: None,
        }
    }

    /// Attach user preferences
    #[must_use]
    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }
}

/// Appearance fields of a generated character
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    /// Hair color
    pub hair_color: String,
    /// Hair style
    pub hair_style: String,
    /// Eye color
    pub eye_color: String,
    /// Outfit description
    pub outfit: String,
    /// Worn accessories
    #[serde(default)]
    pub accessories: Vec<String>,
}

/// Normalized character profile, identical shape regardless of which
/// provider produced it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Character name
    pub name: String,
    /// Flower the character is themed after
    pub flower_name: String,
    /// Short character description
    pub description: String,
    /// Transformation spell
    pub spell: String,
    /// Appearance fields
    pub appearance: Appearance,
    /// Main theme color
    pub main_color: String,
    /// First page background color
    pub first_page_color: String,
    /// Second page background color
    pub second_page_color: String,
}

/// A successful generation plus routing metadata
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    /// The normalized profile
    pub result: GenerationResult,
    /// Provider that served the request
    pub provider: String,
    /// Model that produced the profile
    pub model: String,
    /// Network attempts spent, across retries and the model chain
    pub attempts: u32,
    /// Wall-clock time from selection to result
    pub elapsed: Duration,
}

// ============================================================================
// Generation Settings
// ============================================================================

const SYSTEM_PROMPT: &str = "\
You are a professional magical girl character designer. Given a person's \
real name, design a unique magical girl character.

Design requirements:
1. The magical girl's name must be flower-themed and echo or relate to the \
real name in some way.
2. Appearance traits must be coherent with each other and fit the magical \
girl setting.
3. The transformation spell must be catchy and full of magic.

Return the result strictly as JSON matching the provided schema.";

/// Prompting parameters shared by all providers
#[derive(Clone, Debug)]
pub struct GenerationSettings {
    /// Sampling temperature
    pub temperature: f32,
    /// System prompt constraining the character design
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl GenerationSettings {
    pub(crate) fn user_prompt(&self, request: &GenerationRequest) -> String {
        match &request.preferences {
            Some(preferences) => {
                format!(
                    "Real name: {}\nPreferences: {}",
                    request.seed_name, preferences
                )
            }
            None => format!("Real name: {}", request.seed_name),
        }
    }
}

/// JSON schema the adapters hand to providers for structured output.
pub(crate) fn profile_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "flowerName": { "type": "string" },
            "description": { "type": "string" },
            "spell": { "type": "string" },
            "appearance": {
                "type": "object",
                "properties": {
                    "hairColor": { "type": "string" },
                    "hairStyle": { "type": "string" },
                    "eyeColor": { "type": "string" },
                    "outfit": { "type": "string" },
                    "accessories": { "type": "array", "items": { "type": "string" } },
                },
                "required": ["hairColor", "hairStyle", "eyeColor", "outfit"],
            },
            "mainColor": { "type": "string" },
            "firstPageColor": { "type": "string" },
            "secondPageColor": { "type": "string" },
        },
        "required": [
            "name", "flowerName", "description", "spell", "appearance",
            "mainColor", "firstPageColor", "secondPageColor",
        ],
    })
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Backoff parameters between retry attempts.
///
/// The number of attempts is not part of the policy; it comes from the
/// chosen provider's `retry_count`.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Initial backoff delay
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay
    pub max_backoff_ms: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f32,
    /// Add jitter to backoff
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Calculate backoff duration for attempt N (0-indexed)
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base =
            self.initial_backoff_ms as f64 * f64::from(self.backoff_multiplier.powi(attempt as i32));
        let capped = base.min(self.max_backoff_ms as f64);

        let duration_ms = if self.use_jitter {
            // Add up to 25% jitter
            let jitter = rand::random::<f64>() * 0.25;
            (capped * (1.0 + jitter)) as u64
        } else {
            capped as u64
        };

        Duration::from_millis(duration_ms)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// The generation entry point: selects a provider and drives its adapter
/// through skip rolls, the model chain, and the retry budget.
pub struct Generator {
    selector: Arc<ProviderSelector>,
    strategy: SelectionStrategy,
    settings: GenerationSettings,
    retry: RetryPolicy,
    metrics: Arc<SelectionMetrics>,
    openai: Box<dyn ProviderClient>,
    google: Box<dyn ProviderClient>,
}

impl Generator {
    /// Create a generator over a selector with default settings and the
    /// built-in HTTP adapters
    #[must_use]
    pub fn new(selector: Arc<ProviderSelector>, strategy: SelectionStrategy) -> Self {
        Self {
            selector,
            strategy,
            settings: GenerationSettings::default(),
            retry: RetryPolicy::default(),
            metrics: Arc::new(SelectionMetrics::new()),
            openai: Box::new(OpenAiClient::new()),
            google: Box::new(GoogleClient::new()),
        }
    }

    /// Build a generator from application configuration
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = GenerationSettings {
            temperature: config.temperature,
            ..GenerationSettings::default()
        };
        Self::new(Arc::new(config.selector()), config.strategy).with_settings(settings)
    }

    /// Override the prompting parameters
    #[must_use]
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the retry backoff policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the wire adapters (tests inject mocks here)
    #[must_use]
    pub fn with_clients(
        mut self,
        openai: Box<dyn ProviderClient>,
        google: Box<dyn ProviderClient>,
    ) -> Self {
        self.openai = openai;
        self.google = google;
        self
    }

    /// The underlying selector
    #[must_use]
    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// Selection and outcome counters
    #[must_use]
    pub fn metrics(&self) -> &SelectionMetrics {
        &self.metrics
    }

    fn client_for(&self, kind: ProviderKind) -> &dyn ProviderClient {
        match kind {
            ProviderKind::Openai => self.openai.as_ref(),
            ProviderKind::Google => self.google.as_ref(),
        }
    }

    /// Select a provider, honoring skip probabilities.
    ///
    /// Reselection is bounded; when every pick rolls a skip, the last pick
    /// serves anyway so a fully-skipping configuration still degrades to
    /// "slow" rather than "down".
    fn pick_provider(&self) -> Result<&ProviderConfig, GenerationError> {
        let mut last_pick = None;

        for _ in 0..self.selector.len().saturating_mul(2).max(1) {
            let provider = self
                .selector
                .select(self.strategy)
                .ok_or(GenerationError::NoProviderAvailable)?;

            if provider.skip_probability > 0.0
                && rand::random::<f64>() < provider.skip_probability.min(1.0)
            {
                self.metrics.record_skip(&provider.name);
                debug!(provider = %provider.name, "provider skipped by skip probability");
                last_pick = Some(provider);
                continue;
            }

            return Ok(provider);
        }

        last_pick.ok_or(GenerationError::NoProviderAvailable)
    }

    /// Generate a character profile.
    ///
    /// Walks the chosen provider's model chain once per attempt and spends
    /// up to `retry_count` additional attempts, sleeping the backoff
    /// between attempts. Only the final error escapes, wrapped in
    /// [`GenerationError::ProviderExhausted`].
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let started = Instant::now();

        let provider = self.pick_provider()?;
        self.metrics.record_selection(&provider.name);

        let client = self.client_for(provider.kind);
        let models = provider.model.candidates();
        let mut attempts = 0u32;
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=provider.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff_for_attempt(attempt - 1)).await;
            }

            for model in &models {
                attempts += 1;
                match client
                    .generate(provider, model, request, &self.settings)
                    .await
                {
                    Ok(result) => {
                        self.metrics.record_success(&provider.name);
                        debug!(
                            request_id = %request.request_id,
                            provider = %provider.name,
                            model = %model,
                            attempts,
                            "character profile generated"
                        );
                        return Ok(GenerationOutcome {
                            result,
                            provider: provider.name.clone(),
                            model: (*model).to_string(),
                            attempts,
                            elapsed: started.elapsed(),
                        });
                    }
                    Err(e) => {
                        warn!(
                            request_id = %request.request_id,
                            provider = %provider.name,
                            model = %model,
                            attempt,
                            error = %e,
                            "generation attempt failed"
                        );
                        last_error = Some(e);
                    }
                }
            }
        }

        self.metrics.record_failure(&provider.name);
        Err(GenerationError::ProviderExhausted {
            provider: provider.name.clone(),
            attempts,
            source: last_error.unwrap_or_else(|| anyhow::anyhow!("provider has no usable model")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_backoff() {
        let policy = RetryPolicy {
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 1000,
            use_jitter: false,
        };

        assert_eq!(policy.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.backoff_for_attempt(4), Duration::from_millis(1000)); // Capped
    }

    #[test]
    fn test_user_prompt_includes_preferences() {
        let settings = GenerationSettings::default();

        let bare = GenerationRequest::new("Aoi");
        assert_eq!(settings.user_prompt(&bare), "Real name: Aoi");

        let with_prefs = GenerationRequest::new("Aoi").with_preferences("likes the sea");
        let prompt = settings.user_prompt(&with_prefs);
        assert!(prompt.contains("Aoi"));
        assert!(prompt.contains("likes the sea"));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = GenerationRequest::new("Aoi");
        let b = GenerationRequest::new("Aoi");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_profile_schema_requires_all_fields() {
        let schema = profile_schema();
        let required = schema["required"]
            .as_array()
            .expect("required list")
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>();

        for field in [
            "name",
            "flowerName",
            "description",
            "spell",
            "appearance",
            "mainColor",
            "firstPageColor",
            "secondPageColor",
        ] {
            assert!(required.contains(&field), "missing {field}");
        }
    }

    #[test]
    fn test_result_wire_shape_is_camel_case() {
        let result = GenerationResult {
            name: "Lily Bloom".to_string(),
            flower_name: "lily".to_string(),
            description: "A calm guardian.".to_string(),
            spell: "Petals awaken!".to_string(),
            appearance: Appearance {
                hair_color: "silver".to_string(),
                hair_style: "long".to_string(),
                eye_color: "violet".to_string(),
                outfit: "white dress".to_string(),
                accessories: Vec::new(),
            },
            main_color: "#ffffff".to_string(),
            first_page_color: "#eef7ee".to_string(),
            second_page_color: "#dfefdf".to_string(),
        };

        let value = serde_json::to_value(&result).expect("serializable");
        assert_eq!(value["flowerName"], "lily");
        assert_eq!(value["mainColor"], "#ffffff");
        assert_eq!(value["appearance"]["hairColor"], "silver");

        let back: GenerationResult = serde_json::from_value(value).expect("deserializable");
        assert_eq!(back, result);
    }
}
