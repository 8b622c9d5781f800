//! Error Taxonomy
//!
//! The taxonomy is deliberately narrow. Configuration parse failures are
//! recovered at load time (fail-soft, logged, empty provider list) and
//! never surface as errors; adapter-internal failures feed the retry loop
//! and only the final one escapes.

use thiserror::Error;

/// Errors a generation request can surface to its caller
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No provider survived configuration parsing; callers should present
    /// this as "generation service unavailable"
    #[error("no AI provider available")]
    NoProviderAvailable,

    /// The chosen provider spent its whole retry budget without producing
    /// a decodable profile
    #[error("provider {provider} failed after {attempts} attempts")]
    ProviderExhausted {
        /// Provider that served (and failed) the request
        provider: String,
        /// Network attempts spent, across retries and the model chain
        attempts: u32,
        /// The last underlying failure
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            GenerationError::NoProviderAvailable.to_string(),
            "no AI provider available"
        );

        let exhausted = GenerationError::ProviderExhausted {
            provider: "A".to_string(),
            attempts: 3,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(
            exhausted.to_string(),
            "provider A failed after 3 attempts"
        );
    }
}
