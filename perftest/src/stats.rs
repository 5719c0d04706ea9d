//! Running statistics, progress snapshots and the final report

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::{LatencyHistogram, LatencySummary, RequestRecord};
use crate::outcome::OutcomeKind;

/// Statistics accumulated by the aggregator
///
/// Memory stays constant in the number of records: latencies go into a
/// histogram and only counters grow.
#[derive(Debug)]
pub struct RunningStats {
    started: Instant,
    total: u64,
    succeeded: u64,
    outcomes: BTreeMap<OutcomeKind, u64>,
    http_statuses: BTreeMap<u16, u64>,
    latency_sum: Duration,
    latency_count: u64,
    histogram: LatencyHistogram,
}

impl RunningStats {
    /// Start accumulating; `started` anchors elapsed time
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            total: 0,
            succeeded: 0,
            outcomes: BTreeMap::new(),
            http_statuses: BTreeMap::new(),
            latency_sum: Duration::ZERO,
            latency_count: 0,
            histogram: LatencyHistogram::new(),
        }
    }

    /// Fold in one record
    pub fn record(&mut self, record: &RequestRecord) {
        self.total += 1;
        if record.outcome.is_success() {
            self.succeeded += 1;
        }
        *self.outcomes.entry(record.outcome.kind()).or_default() += 1;
        if let Some(status) = record.outcome.http_status() {
            *self.http_statuses.entry(status).or_default() += 1;
        }
        if let Some(latency) = record.latency {
            self.latency_sum += latency;
            self.latency_count += 1;
            self.histogram.record(latency);
        }
    }

    /// Items recorded so far
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Failed items so far
    pub fn failed(&self) -> u64 {
        self.total - self.succeeded
    }

    /// Count for one outcome kind
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        self.outcomes.get(&kind).copied().unwrap_or(0)
    }

    /// Progress snapshot at this instant
    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self.started.elapsed();
        ProgressSnapshot {
            completed: self.total,
            elapsed,
            throughput: rate(self.total, elapsed),
            errors: self.failed(),
        }
    }

    fn mean_latency(&self) -> Duration {
        if self.latency_count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.latency_sum.as_nanos() / u128::from(self.latency_count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Close the run and build its report
    pub fn finish(self, run: RunInfo) -> FinalReport {
        let elapsed = self.started.elapsed();
        let mut outcomes: BTreeMap<OutcomeKind, u64> =
            OutcomeKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        outcomes.extend(self.outcomes.iter().map(|(kind, n)| (*kind, *n)));

        FinalReport {
            target: run.target,
            workers: run.workers,
            started_at: run.started_at,
            finished_at: Utc::now(),
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed(),
            requests_issued: self.latency_count,
            elapsed_secs: elapsed.as_secs_f64(),
            throughput: rate(self.total, elapsed),
            success_rate: success_rate(self.succeeded, self.latency_count),
            latency: self.histogram.summary(self.mean_latency()),
            outcomes,
            http_statuses: self.http_statuses,
        }
    }
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn success_rate(succeeded: u64, issued: u64) -> Option<f64> {
    (issued > 0).then(|| succeeded as f64 / issued as f64 * 100.0)
}

/// Run metadata carried into the report
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Target URL or description
    pub target: String,
    /// Worker count
    pub workers: usize,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
}

/// Periodic progress snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Items completed so far
    pub completed: u64,
    /// Time since the run started
    pub elapsed: Duration,
    /// Completions per second
    pub throughput: f64,
    /// Failed items so far
    pub errors: u64,
}

impl std::fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {} requests in {:.2}s ({:.2} req/sec) - Errors: {}",
            self.completed,
            self.elapsed.as_secs_f64(),
            self.throughput,
            self.errors
        )
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    /// Target URL
    pub target: String,
    /// Worker count
    pub workers: usize,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub finished_at: DateTime<Utc>,
    /// Items processed, malformed input included
    pub total: u64,
    /// Successful requests
    pub succeeded: u64,
    /// Everything else
    pub failed: u64,
    /// Requests actually sent
    pub requests_issued: u64,
    /// Per-outcome counts; every kind is present
    pub outcomes: BTreeMap<OutcomeKind, u64>,
    /// Counts of non-2xx statuses
    pub http_statuses: BTreeMap<u16, u64>,
    /// Run duration in seconds
    pub elapsed_secs: f64,
    /// Items per second over the run
    pub throughput: f64,
    /// Percentage of issued requests that succeeded; absent when none were issued
    pub success_rate: Option<f64>,
    /// Latency over issued requests; absent when none were issued
    pub latency: Option<LatencySummary>,
}

impl FinalReport {
    /// Count for one outcome kind
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        self.outcomes.get(&kind).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for FinalReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance test results for {}", self.target)?;
        writeln!(f, "  Workers:             {}", self.workers)?;
        writeln!(f, "  Total items:         {}", self.total)?;
        writeln!(f, "  Requests issued:     {}", self.requests_issued)?;
        writeln!(f, "  Successful:          {}", self.succeeded)?;
        writeln!(f, "  Errors:              {}", self.failed)?;
        match self.success_rate {
            Some(rate) => writeln!(f, "  Success rate:        {rate:.2}%")?,
            None => writeln!(f, "  Success rate:        N/A")?,
        }
        for (kind, count) in self.outcomes.iter().filter(|(k, _)| **k != OutcomeKind::Success) {
            if *count > 0 {
                writeln!(f, "    {kind}: {count}")?;
            }
        }
        for (status, count) in &self.http_statuses {
            writeln!(f, "      HTTP {status}: {count}")?;
        }
        writeln!(f, "  Total time:          {:.2}s", self.elapsed_secs)?;
        writeln!(f, "  Average throughput:  {:.2} req/sec", self.throughput)?;

        match &self.latency {
            Some(latency) => {
                writeln!(f, "  Average response time: {:.2} ms", latency.mean_ms)?;
                writeln!(f, "  Minimum response time: {:.2} ms", latency.min_ms)?;
                writeln!(f, "  Maximum response time: {:.2} ms", latency.max_ms)?;
                writeln!(f, "  Standard deviation:    {:.2} ms", latency.stddev_ms)?;
                writeln!(f, "  Median response time:  {:.2} ms", latency.p50_ms)?;
                writeln!(f, "  90th percentile:       {:.2} ms", latency.p90_ms)?;
                writeln!(f, "  95th percentile:       {:.2} ms", latency.p95_ms)?;
                write!(f, "  99th percentile:       {:.2} ms", latency.p99_ms)
            }
            None => write!(
                f,
                "  No requests were issued; latency statistics are unavailable"
            ),
        }
    }
}
