//! Application Configuration
//!
//! Environment-variable configuration for the generation core. The provider
//! list itself stays a raw JSON string here; parsing it is the selector's
//! job so the fail-soft policy lives in one place.

use std::sync::OnceLock;

use crate::provider::{ProviderSelector, SelectionStrategy};

/// Configuration for the generation core
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Raw JSON provider array from `AI_PROVIDERS_CONFIG`
    pub providers_config: Option<String>,
    /// Load-balancing strategy from `AI_LOAD_BALANCE_STRATEGY`
    pub strategy: SelectionStrategy,
    /// Sampling temperature from `AI_GENERATION_TEMPERATURE`
    pub temperature: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers_config: None,
            strategy: SelectionStrategy::default(),
            temperature: 0.8,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `AI_PROVIDERS_CONFIG`: JSON array of provider objects
    /// - `AI_LOAD_BALANCE_STRATEGY`: "sequential", "random", "round_robin"
    ///   (unrecognized values fall back to "random")
    /// - `AI_GENERATION_TEMPERATURE`: sampling temperature (default 0.8)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            providers_config: std::env::var("AI_PROVIDERS_CONFIG").ok(),
            strategy: std::env::var("AI_LOAD_BALANCE_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            temperature: std::env::var("AI_GENERATION_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.8),
        }
    }

    /// Build a selector over this configuration's provider list
    #[must_use]
    pub fn selector(&self) -> ProviderSelector {
        match &self.providers_config {
            Some(raw) => ProviderSelector::from_config_str(raw),
            None => ProviderSelector::new(Vec::new()),
        }
    }

    /// Process-wide configuration, read from the environment once on first
    /// access and cached for the process lifetime
    pub fn global() -> &'static AppConfig {
        static CONFIG: OnceLock<AppConfig> = OnceLock::new();
        CONFIG.get_or_init(AppConfig::from_env)
    }
}

/// Process-wide selector over the global configuration.
///
/// The provider list is parsed exactly once even when concurrent callers
/// race the first access; every caller observes the same list and shares
/// one round-robin cursor.
pub fn shared_selector() -> &'static ProviderSelector {
    static SELECTOR: OnceLock<ProviderSelector> = OnceLock::new();
    SELECTOR.get_or_init(|| AppConfig::global().selector())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.providers_config.is_none());
        assert_eq!(config.strategy, SelectionStrategy::Random);
        assert!((config.temperature - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_selector_without_providers_is_empty() {
        let config = AppConfig::default();
        assert!(config.selector().is_empty());
    }

    #[test]
    fn test_selector_from_config_string() {
        let config = AppConfig {
            providers_config: Some(
                r#"[{"name":"A","apiKey":"k","baseUrl":"u","model":"m","type":"openai"}]"#
                    .to_string(),
            ),
            ..AppConfig::default()
        };

        let selector = config.selector();
        assert_eq!(selector.len(), 1);
        assert_eq!(selector.providers()[0].name, "A");
    }
}
