//! Selection Metrics
//!
//! Observability for provider selection:
//! - Selections and skips per provider
//! - Generation successes and failures per provider
//! - Global totals and uptime

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

// ============================================================================
// Counter
// ============================================================================

/// A simple atomic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Per-Provider Metrics
// ============================================================================

/// Counters for a single provider
#[derive(Debug, Default)]
pub struct ProviderMetrics {
    /// Times this provider was chosen by the selector
    pub selections: Counter,
    /// Times a skip roll routed a request away from this provider
    pub skips: Counter,
    /// Generation requests that produced a profile
    pub successes: Counter,
    /// Generation requests that exhausted the retry budget
    pub failures: Counter,
}

impl ProviderMetrics {
    /// Failed fraction of finished requests (0.0 when none finished)
    pub fn error_rate(&self) -> f64 {
        let finished = self.successes.get() + self.failures.get();
        if finished == 0 {
            return 0.0;
        }
        self.failures.get() as f64 / finished as f64
    }

    fn summary(&self, name: &str) -> ProviderMetricsSummary {
        ProviderMetricsSummary {
            name: name.to_string(),
            selections: self.selections.get(),
            skips: self.skips.get(),
            successes: self.successes.get(),
            failures: self.failures.get(),
            error_rate: self.error_rate(),
        }
    }
}

/// Snapshot of one provider's counters
#[derive(Clone, Debug)]
pub struct ProviderMetricsSummary {
    pub name: String,
    pub selections: u64,
    pub skips: u64,
    pub successes: u64,
    pub failures: u64,
    pub error_rate: f64,
}

// ============================================================================
// Selection Metrics
// ============================================================================

/// Centralized metrics for provider selection and generation outcomes
pub struct SelectionMetrics {
    providers: DashMap<String, Arc<ProviderMetrics>>,

    /// Generation requests that reached provider selection
    pub total_requests: Counter,
    /// Skip rolls across all providers
    pub total_skips: Counter,
    /// Requests that exhausted their provider's retry budget
    pub total_failures: Counter,

    started_at: Instant,
}

impl SelectionMetrics {
    /// Create a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
            total_requests: Counter::new(),
            total_skips: Counter::new(),
            total_failures: Counter::new(),
            started_at: Instant::now(),
        }
    }

    /// Get or create metrics for a provider
    pub fn provider(&self, name: &str) -> Arc<ProviderMetrics> {
        let entry = self.providers.entry(name.to_string()).or_default();
        Arc::clone(&entry)
    }

    /// Record that the selector chose a provider for a request
    pub fn record_selection(&self, name: &str) {
        self.total_requests.inc();
        self.provider(name).selections.inc();
    }

    /// Record a skip roll that routed a request away from a provider
    pub fn record_skip(&self, name: &str) {
        self.total_skips.inc();
        self.provider(name).skips.inc();
    }

    /// Record a generation that produced a profile
    pub fn record_success(&self, name: &str) {
        self.provider(name).successes.inc();
    }

    /// Record a generation that exhausted the retry budget
    pub fn record_failure(&self, name: &str) {
        self.total_failures.inc();
        self.provider(name).failures.inc();
    }

    /// Time since this collector was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Snapshot of every provider's counters
    pub fn summaries(&self) -> Vec<ProviderMetricsSummary> {
        self.providers
            .iter()
            .map(|entry| entry.value().summary(entry.key()))
            .collect()
    }
}

impl Default for SelectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_record_flow() {
        let metrics = SelectionMetrics::new();

        metrics.record_selection("a");
        metrics.record_success("a");
        metrics.record_selection("a");
        metrics.record_failure("a");
        metrics.record_skip("b");

        let a = metrics.provider("a");
        assert_eq!(a.selections.get(), 2);
        assert_eq!(a.successes.get(), 1);
        assert_eq!(a.failures.get(), 1);
        assert!((a.error_rate() - 0.5).abs() < 0.01);

        assert_eq!(metrics.total_requests.get(), 2);
        assert_eq!(metrics.total_skips.get(), 1);
        assert_eq!(metrics.total_failures.get(), 1);
        assert_eq!(metrics.summaries().len(), 2);
    }

    #[test]
    fn test_error_rate_without_finished_requests() {
        let metrics = ProviderMetrics::default();
        assert!(metrics.error_rate().abs() < f64::EPSILON);
    }
}
