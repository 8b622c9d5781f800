//! Provider Client Trait
//!
//! Trait definition for provider adapters, plus the shared response
//! decoding used by all of them.
//!
//! # Design Philosophy
//!
//! An adapter is a thin translation layer: build the provider-specific
//! request body, send it, pull the text payload out of the
//! provider-specific envelope, and decode that payload as a
//! [`GenerationResult`]. Failures are plain `anyhow` errors for the
//! generation layer's retry loop to consume.

use async_trait::async_trait;

use crate::generation::{GenerationRequest, GenerationResult, GenerationSettings};
use crate::provider::ProviderConfig;

/// Provider adapter trait
///
/// Implement this trait to add support for another wire format.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Adapter name (e.g. "openai", "google")
    fn name(&self) -> &str;

    /// Perform one generation call against one model of the given provider.
    ///
    /// The adapter must not retry internally; one call maps to one network
    /// attempt so the caller's retry budget stays meaningful.
    async fn generate(
        &self,
        provider: &ProviderConfig,
        model: &str,
        request: &GenerationRequest,
        settings: &GenerationSettings,
    ) -> anyhow::Result<GenerationResult>;
}

/// Decode a provider text payload into a [`GenerationResult`].
///
/// Providers occasionally wrap JSON output in Markdown code fences even
/// when asked for raw JSON, so fences are stripped before decoding.
pub(crate) fn decode_profile(payload: &str) -> anyhow::Result<GenerationResult> {
    let profile = serde_json::from_str(strip_code_fences(payload))?;
    Ok(profile)
}

fn strip_code_fences(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r##"{
        "name": "Lily Bloom",
        "flowerName": "lily",
        "description": "A calm guardian.",
        "spell": "Petals awaken, light unfold!",
        "appearance": {
            "hairColor": "silver",
            "hairStyle": "long twin tails",
            "eyeColor": "violet",
            "outfit": "white and green dress",
            "accessories": ["lily hairpin"]
        },
        "mainColor": "#ffffff",
        "firstPageColor": "#eef7ee",
        "secondPageColor": "#dfefdf"
    }"##;

    #[test]
    fn test_decode_plain_json() {
        let profile = decode_profile(PROFILE).expect("valid profile");
        assert_eq!(profile.name, "Lily Bloom");
        assert_eq!(profile.appearance.accessories, vec!["lily hairpin"]);
    }

    #[test]
    fn test_decode_fenced_json() {
        let fenced = format!("```json\n{PROFILE}\n```");
        let profile = decode_profile(&fenced).expect("valid fenced profile");
        assert_eq!(profile.flower_name, "lily");
    }

    #[test]
    fn test_decode_fenced_without_language_tag() {
        let fenced = format!("```\n{PROFILE}\n```");
        assert!(decode_profile(&fenced).is_ok());
    }

    #[test]
    fn test_decode_schema_mismatch_is_error() {
        assert!(decode_profile(r#"{"name": "only a name"}"#).is_err());
        assert!(decode_profile("not json").is_err());
    }
}
