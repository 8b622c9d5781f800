//! Provider Configuration
//!
//! Configuration types for AI providers and the fail-soft parser that loads
//! them from the `AI_PROVIDERS_CONFIG` JSON array.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Provider Kind and Response Mode
// ============================================================================

/// Wire-format family of a provider, selecting the client adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions API
    Openai,
    /// Google-compatible generateContent API
    Google,
}

impl ProviderKind {
    /// Stable lowercase name, matching the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Google => "google",
        }
    }
}

/// How the adapter asks the provider for structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Request a JSON response body (`response_format: json_object`)
    Json,
    /// Let the provider decide; the adapter decodes whatever comes back
    #[default]
    Auto,
    /// Force a tool/function call carrying the profile as arguments
    Tool,
}

// ============================================================================
// Model Spec
// ============================================================================

/// One model identifier or an ordered fallback chain of identifiers.
///
/// The wire shape is either a plain string or an array of strings; both are
/// preserved as configured so the list round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSpec {
    /// A single model identifier
    Single(String),
    /// An ordered chain tried front to back
    Chain(Vec<String>),
}

impl ModelSpec {
    /// The first model in the chain, used as the application default.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(model) => Some(model.as_str()),
            Self::Chain(models) => models.first().map(String::as_str),
        }
    }

    /// All models in chain order.
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            Self::Single(model) => vec![model.as_str()],
            Self::Chain(models) => models.iter().map(String::as_str).collect(),
        }
    }

    /// True when no usable model identifier is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(model) => model.is_empty(),
            Self::Chain(models) => models.iter().all(String::is_empty),
        }
    }
}

// ============================================================================
// Provider Config
// ============================================================================

fn default_retry_count() -> u32 {
    1
}

fn default_weight() -> f64 {
    1.0
}

/// A configured AI backend.
///
/// Parsed once at startup and immutable afterwards. `weight` and
/// `skip_probability` are carried through to the generation layer; the
/// selection algorithm itself never consults them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Human label, unique within the list (not enforced)
    #[serde(default)]
    pub name: String,

    /// API credential sent to the provider
    pub api_key: String,

    /// Base URL of the provider endpoint
    pub base_url: String,

    /// Model identifier, or an ordered fallback chain
    pub model: ModelSpec,

    /// Wire-format family selecting the client adapter
    #[serde(rename = "type")]
    pub kind: ProviderKind,

    /// Additional attempts after a failed generation call
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Probability in [0,1] that this provider is skipped even when selected
    #[serde(default)]
    pub skip_probability: f64,

    /// Structured-output hint for the adapter
    #[serde(default)]
    pub mode: ResponseMode,

    /// Relative likelihood under weighted strategies (parsed, not enforced)
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl ProviderConfig {
    /// A provider is only usable with credentials, a target, and a model.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.base_url.is_empty() && !self.model.is_empty()
    }
}

// ============================================================================
// Fail-Soft Parsing
// ============================================================================

/// Parse a JSON array of provider objects into the retained provider list.
///
/// Fail-soft on every level: malformed top-level JSON yields an empty list
/// (logged as a warning, never an error), and an entry that does not decode
/// or is missing `apiKey`, `baseUrl`, `model`, or `type` drops only that
/// entry. Survivors keep configuration order and get defaults filled
/// (`retry_count = 1`, `skip_probability = 0`, `weight = 1`).
#[must_use]
pub fn parse_providers(raw: &str) -> Vec<ProviderConfig> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "invalid provider configuration, no providers loaded");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match serde_json::from_value::<ProviderConfig>(entry) {
                Ok(provider) if provider.is_complete() => Some(provider),
                Ok(provider) => {
                    warn!(index, name = %provider.name, "provider entry incomplete, dropped");
                    None
                }
                Err(e) => {
                    warn!(index, error = %e, "provider entry failed to decode, dropped");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_entry_round_trips() {
        let raw = r#"[{
            "name": "A",
            "apiKey": "k1",
            "baseUrl": "https://a.example",
            "model": "m1",
            "type": "openai",
            "retryCount": 3,
            "skipProbability": 0.2,
            "mode": "tool",
            "weight": 2.5
        }]"#;

        let providers = parse_providers(raw);
        assert_eq!(providers.len(), 1);

        let provider = &providers[0];
        assert_eq!(provider.name, "A");
        assert_eq!(provider.api_key, "k1");
        assert_eq!(provider.base_url, "https://a.example");
        assert_eq!(provider.model, ModelSpec::Single("m1".to_string()));
        assert_eq!(provider.kind, ProviderKind::Openai);
        assert_eq!(provider.retry_count, 3);
        assert!((provider.skip_probability - 0.2).abs() < f64::EPSILON);
        assert_eq!(provider.mode, ResponseMode::Tool);
        assert!((provider.weight - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_fills_defaults() {
        let raw = r#"[{"name":"A","apiKey":"k","baseUrl":"u","model":"m","type":"google"}]"#;

        let providers = parse_providers(raw);
        assert_eq!(providers.len(), 1);

        let provider = &providers[0];
        assert_eq!(provider.retry_count, 1);
        assert!(provider.skip_probability.abs() < f64::EPSILON);
        assert_eq!(provider.mode, ResponseMode::Auto);
        assert!((provider.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_drops_entry_missing_api_key() {
        let raw = r#"[
            {"name":"A","baseUrl":"u1","model":"m1","type":"openai"},
            {"name":"B","apiKey":"k2","baseUrl":"u2","model":"m2","type":"google"}
        ]"#;

        let providers = parse_providers(raw);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "B");
        assert_eq!(providers[0].retry_count, 1);
    }

    #[test]
    fn test_parse_drops_empty_credentials() {
        let raw = r#"[{"name":"A","apiKey":"","baseUrl":"u","model":"m","type":"openai"}]"#;
        assert!(parse_providers(raw).is_empty());
    }

    #[test]
    fn test_parse_invalid_json_yields_empty_list() {
        assert!(parse_providers("not json at all").is_empty());
        assert!(parse_providers("{\"truncated\":").is_empty());
        // A top-level object is not a provider array either
        assert!(parse_providers("{}").is_empty());
    }

    #[test]
    fn test_parse_preserves_order() {
        let raw = r#"[
            {"name":"A","apiKey":"k1","baseUrl":"u1","model":"m1","type":"openai"},
            {"name":"B","apiKey":"k2","baseUrl":"u2","model":"m2","type":"google"},
            {"name":"C","apiKey":"k3","baseUrl":"u3","model":"m3","type":"openai"}
        ]"#;

        let names: Vec<String> = parse_providers(raw).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_model_spec_chain() {
        let raw = r#"[{"name":"A","apiKey":"k","baseUrl":"u","model":["m1","m2"],"type":"openai"}]"#;

        let providers = parse_providers(raw);
        assert_eq!(providers[0].model.primary(), Some("m1"));
        assert_eq!(providers[0].model.candidates(), vec!["m1", "m2"]);
    }

    #[test]
    fn test_unknown_provider_kind_dropped() {
        let raw = r#"[
            {"name":"A","apiKey":"k1","baseUrl":"u1","model":"m1","type":"mystery"},
            {"name":"B","apiKey":"k2","baseUrl":"u2","model":"m2","type":"openai"}
        ]"#;

        let providers = parse_providers(raw);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "B");
    }

    #[test]
    fn test_model_spec_empty_chain_is_incomplete() {
        let spec = ModelSpec::Chain(Vec::new());
        assert!(spec.is_empty());
        assert_eq!(spec.primary(), None);
    }
}
