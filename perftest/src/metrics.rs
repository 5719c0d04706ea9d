//! Latency recording and percentile calculation

use std::time::Duration;

use serde::Serialize;

use crate::outcome::Outcome;

/// Largest recordable latency: one hour, in microseconds
const MAX_LATENCY_MICROS: u64 = 3_600_000_000;

/// Latency summary (all values in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    /// Exact mean
    pub mean_ms: f64,
    /// Minimum value
    pub min_ms: f64,
    /// 50th percentile (median)
    pub p50_ms: f64,
    /// 90th percentile
    pub p90_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// 99th percentile
    pub p99_ms: f64,
    /// Maximum value
    pub max_ms: f64,
    /// Standard deviation, from the histogram
    pub stddev_ms: f64,
}

/// In-memory histogram for efficient percentile calculation
/// Uses HdrHistogram for memory-efficient storage of large datasets
pub struct LatencyHistogram {
    histogram: hdrhistogram::Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new histogram
    /// Configured for microsecond precision with max 1 hour latency
    pub fn new() -> Self {
        // 3 significant digits bounds the relative error at 0.1%
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, MAX_LATENCY_MICROS, 3)
            .expect("Failed to create histogram");
        Self { histogram }
    }

    /// Record a duration, clamping values beyond one hour
    pub fn record(&mut self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros);
    }

    /// Get the number of recorded values
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// Check if the histogram is empty
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Value at `quantile` (0.0 - 1.0), in milliseconds
    pub fn quantile_ms(&self, quantile: f64) -> f64 {
        self.histogram.value_at_quantile(quantile) as f64 / 1000.0
    }

    /// Summarize, using `mean` as the exact mean
    ///
    /// Returns `None` when nothing was recorded.
    pub fn summary(&self, mean: Duration) -> Option<LatencySummary> {
        if self.histogram.is_empty() {
            return None;
        }

        Some(LatencySummary {
            mean_ms: mean.as_secs_f64() * 1000.0,
            min_ms: self.histogram.min() as f64 / 1000.0,
            p50_ms: self.quantile_ms(0.50),
            p90_ms: self.quantile_ms(0.90),
            p95_ms: self.quantile_ms(0.95),
            p99_ms: self.quantile_ms(0.99),
            max_ms: self.histogram.max() as f64 / 1000.0,
            stddev_ms: self.histogram.stdev() / 1000.0,
        })
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LatencyHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyHistogram")
            .field("len", &self.histogram.len())
            .finish()
    }
}

/// One completed input item, as sent to the aggregator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestRecord {
    /// Classification
    pub outcome: Outcome,
    /// Wall time of the request; `None` when no request was issued
    pub latency: Option<Duration>,
}

impl RequestRecord {
    /// Record for an issued request
    pub fn issued(outcome: Outcome, latency: Duration) -> Self {
        Self {
            outcome,
            latency: Some(latency),
        }
    }

    /// Record for a rejected input line
    pub fn malformed_input() -> Self {
        Self {
            outcome: Outcome::MalformedInput,
            latency: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_percentiles() {
        let mut histogram = LatencyHistogram::new();

        for i in 1..=100 {
            histogram.record(Duration::from_millis(i));
        }

        let summary = histogram.summary(Duration::from_micros(50_500)).unwrap();
        assert!((summary.min_ms - 1.0).abs() < 0.1);
        assert!((summary.max_ms - 100.0).abs() < 0.1);
        assert!((summary.p50_ms - 50.0).abs() < 1.0);
        assert!((summary.p99_ms - 99.0).abs() < 1.0);
        assert!((summary.mean_ms - 50.5).abs() < 1e-9);
        assert!(summary.p50_ms <= summary.p90_ms);
        assert!(summary.p90_ms <= summary.p95_ms);
        assert!(summary.p95_ms <= summary.p99_ms);
    }

    #[test]
    fn test_histogram_stddev() {
        let mut histogram = LatencyHistogram::new();
        for _ in 0..10 {
            histogram.record(Duration::from_millis(40));
        }
        let flat = histogram.summary(Duration::from_millis(40)).unwrap();
        assert!(flat.stddev_ms.abs() < 0.1);

        let mut histogram = LatencyHistogram::new();
        histogram.record(Duration::from_millis(10));
        histogram.record(Duration::from_millis(30));
        let spread = histogram.summary(Duration::from_millis(20)).unwrap();
        assert!((spread.stddev_ms - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_empty_histogram() {
        let histogram = LatencyHistogram::new();
        assert!(histogram.is_empty());
        assert!(histogram.summary(Duration::ZERO).is_none());
    }

    #[test]
    fn test_histogram_clamps_huge_values() {
        let mut histogram = LatencyHistogram::new();
        histogram.record(Duration::from_secs(10 * 3600));
        histogram.record(Duration::ZERO);

        assert_eq!(histogram.len(), 2);
        let summary = histogram.summary(Duration::from_secs(1)).unwrap();
        assert!(summary.max_ms <= 3_600_000.0 * 1.001);
    }

    #[test]
    fn test_records() {
        let issued = RequestRecord::issued(Outcome::Success, Duration::from_millis(3));
        assert_eq!(issued.latency, Some(Duration::from_millis(3)));

        let malformed = RequestRecord::malformed_input();
        assert_eq!(malformed.outcome, Outcome::MalformedInput);
        assert!(malformed.latency.is_none());
    }
}
