//! In-memory metrics sink.
//!
//! Keeps every series in process so tests can assert on what the engine
//! emitted without a global registry.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::ports::metrics::{Labels, MetricsSink};

/// Series key: metric name plus `k=v` label pairs sorted by key.
fn series_key(name: &str, labels: Labels<'_>) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let mut pairs: Vec<_> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{name}{{{}}}", pairs.join(","))
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: RwLock<BTreeMap<String, u64>>,
    gauges: RwLock<BTreeMap<String, f64>>,
    histograms: RwLock<BTreeMap<String, Vec<f64>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, labels: Labels<'_>) -> u64 {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters.get(&series_key(name, labels)).copied().unwrap_or(0)
    }

    /// Sum of a counter across all label sets.
    pub fn counter_total(&self, name: &str) -> u64 {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .iter()
            .filter(|(key, _)| key.as_str() == name || key.starts_with(&format!("{name}{{")))
            .map(|(_, value)| *value)
            .sum()
    }

    pub fn gauge(&self, name: &str, labels: Labels<'_>) -> Option<f64> {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        gauges.get(&series_key(name, labels)).copied()
    }

    pub fn observations(&self, name: &str, labels: Labels<'_>) -> Vec<f64> {
        let histograms = self.histograms.read().unwrap_or_else(PoisonError::into_inner);
        histograms.get(&series_key(name, labels)).cloned().unwrap_or_default()
    }

    /// Flat `series value` lines, sorted, for human display.
    pub fn snapshot(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (key, value) in self.counters.read().unwrap_or_else(PoisonError::into_inner).iter() {
            lines.push(format!("{key} {value}"));
        }
        for (key, value) in self.gauges.read().unwrap_or_else(PoisonError::into_inner).iter() {
            lines.push(format!("{key} {value:.2}"));
        }
        for (key, values) in self.histograms.read().unwrap_or_else(PoisonError::into_inner).iter() {
            let sum: f64 = values.iter().sum();
            lines.push(format!("{key} count={} sum={sum:.3}", values.len()));
        }
        lines.sort();
        lines
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment_counter(&self, name: &str, labels: Labels<'_>, value: u64) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        *counters.entry(series_key(name, labels)).or_insert(0) += value;
    }

    fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64) {
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        gauges.insert(series_key(name, labels), value);
    }

    fn observe_histogram(&self, name: &str, labels: Labels<'_>, value: f64) {
        let mut histograms = self.histograms.write().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(series_key(name, labels)).or_default().push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_keyed_by_labels() {
        let metrics = InMemoryMetrics::new();
        metrics.increment_counter("transformations_total", &[("type", "refactor")], 1);
        metrics.increment_counter("transformations_total", &[("type", "refactor")], 2);
        metrics.increment_counter("transformations_total", &[("type", "prune")], 1);

        assert_eq!(metrics.counter("transformations_total", &[("type", "refactor")]), 3);
        assert_eq!(metrics.counter("transformations_total", &[("type", "merge")]), 0);
        assert_eq!(metrics.counter_total("transformations_total"), 4);
    }

    #[test]
    fn test_label_order_does_not_matter() {
        let metrics = InMemoryMetrics::new();
        metrics.set_gauge("g", &[("b", "2"), ("a", "1")], 0.5);
        assert_eq!(metrics.gauge("g", &[("a", "1"), ("b", "2")]), Some(0.5));
    }

    #[test]
    fn test_histogram_observations() {
        let metrics = InMemoryMetrics::new();
        metrics.observe_histogram("duration", &[], 1.5);
        metrics.observe_histogram("duration", &[], 0.5);
        assert_eq!(metrics.observations("duration", &[]), vec![1.5, 0.5]);
        assert_eq!(metrics.snapshot(), vec!["duration count=2 sum=2.000".to_string()]);
    }
}
