//! Provider Selector
//!
//! Picks one provider per generation request. Three strategies:
//!
//! - `random`: uniform random index, independent across calls
//! - `sequential`: seconds-since-epoch modulo list length. The bucket
//!   rotates about once per second, not per call, so bursts within the same
//!   second land on the same provider. This coarse behavior is intentional
//!   and distinct from `round_robin`.
//! - `round_robin`: a selector-owned atomic cursor advances by one
//!   (mod list length) on every call
//!
//! The cursor is instance state, not a process-wide variable, so tests can
//! construct independent selectors with independent cursors.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::{parse_providers, ModelSpec, ProviderConfig};

// ============================================================================
// Selection Strategy
// ============================================================================

/// Policy by which one provider is chosen among several.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Uniform random pick
    #[default]
    Random,
    /// Wall-clock-bucketed pick, rotating roughly once per second
    Sequential,
    /// Cyclic pick advancing on every call
    RoundRobin,
}

impl FromStr for SelectionStrategy {
    type Err = std::convert::Infallible;

    /// Unrecognized strategy names fall back to `Random`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "sequential" => Self::Sequential,
            "round_robin" => Self::RoundRobin,
            _ => Self::Random,
        })
    }
}

// ============================================================================
// Provider Selector
// ============================================================================

/// Holds the immutable provider list and the round-robin cursor.
#[derive(Debug)]
pub struct ProviderSelector {
    providers: Vec<ProviderConfig>,
    cursor: AtomicUsize,
}

impl ProviderSelector {
    /// Create a selector over an already-parsed provider list.
    #[must_use]
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Create a selector from the raw `AI_PROVIDERS_CONFIG` JSON string.
    ///
    /// Parsing is fail-soft: a malformed configuration yields a selector
    /// with no providers, and every `select` call returns `None`.
    #[must_use]
    pub fn from_config_str(raw: &str) -> Self {
        Self::new(parse_providers(raw))
    }

    /// The retained provider list, in configuration order.
    #[must_use]
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Number of retained providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no provider survived configuration parsing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The first configured provider's model, used as the application
    /// default.
    #[must_use]
    pub fn default_model(&self) -> Option<&ModelSpec> {
        self.providers.first().map(|provider| &provider.model)
    }

    /// Pick one provider according to `strategy`.
    ///
    /// Returns `None` only when the provider list is empty; callers must
    /// treat that as "generation service unavailable". The returned
    /// reference is one of the configured entries, unmodified.
    #[must_use]
    pub fn select(&self, strategy: SelectionStrategy) -> Option<&ProviderConfig> {
        if self.providers.is_empty() {
            return None;
        }

        let index = match strategy {
            SelectionStrategy::Random => rand::thread_rng().gen_range(0..self.providers.len()),
            SelectionStrategy::Sequential => {
                let now = chrono::Utc::now().timestamp();
                now.rem_euclid(self.providers.len() as i64) as usize
            }
            SelectionStrategy::RoundRobin => self.advance_cursor(),
        };

        self.providers.get(index)
    }

    /// Advance the round-robin cursor by one (mod list length) and return
    /// the index it held before the advance.
    ///
    /// The increment is a single atomic read-modify-write, so concurrent
    /// callers never observe a skipped or repeated index.
    fn advance_cursor(&self) -> usize {
        let len = self.providers.len();
        self.cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some((current + 1) % len)
            })
            .unwrap_or(0)
    }
}
