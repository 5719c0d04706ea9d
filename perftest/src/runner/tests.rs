//! Tests for the Runner module

use super::builder::RunnerBuilder;
use crate::channel::ChannelConfig;
use crate::client::SearchClient;
use crate::error::HarnessError;
use crate::input::InputReader;
use crate::outcome::{Outcome, OutcomeKind};
use crate::stats::ProgressSnapshot;

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock SearchClient
// ============================================================================

/// Client answering from the payload: `"status": n` gives an HTTP error,
/// `"timeout": true` a timeout, `"garbage": true` a malformed response.
#[derive(Default)]
struct MockClient {
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockClient {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SearchClient for MockClient {
    fn target(&self) -> &str {
        "mock://search"
    }

    async fn search(&self, payload: String) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        if let Some(status) = value.get("status").and_then(|s| s.as_u64()) {
            return Outcome::HttpError {
                status: status as u16,
            };
        }
        if value.get("timeout").is_some() {
            return Outcome::Timeout;
        }
        if value.get("garbage").is_some() {
            return Outcome::MalformedResponse;
        }
        Outcome::Success
    }
}

fn good_lines(n: usize) -> String {
    (0..n)
        .map(|i| format!("{{\"NAME_FULL\": \"Person {i}\"}}\n"))
        .collect()
}

fn runner_with(client: Arc<MockClient>, workers: usize) -> super::Runner {
    RunnerBuilder::new()
        .workers(workers)
        .client(client)
        .build()
        .unwrap()
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_rejects_invalid_config() {
    assert!(matches!(
        RunnerBuilder::new().workers(0).build(),
        Err(HarnessError::Config(_))
    ));
    assert!(matches!(
        RunnerBuilder::new().report_interval(0).build(),
        Err(HarnessError::Config(_))
    ));
}

#[test]
fn test_builder_defaults_to_http_client() {
    let runner = RunnerBuilder::new().workers(2).build().unwrap();
    assert_eq!(runner.config().workers, 2);
    assert_eq!(runner.client.target(), "http://localhost:5000/search");
}

// ============================================================================
// Runs
// ============================================================================

#[tokio::test]
async fn test_all_successful_lines() {
    let client = Arc::new(MockClient::with_delay(Duration::from_millis(2)));
    let runner = runner_with(client.clone(), 4);
    let input = good_lines(10);

    let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    assert_eq!(report.total, 10);
    assert_eq!(report.succeeded, 10);
    assert_eq!(report.failed, 0);
    assert_eq!(report.requests_issued, 10);
    assert_eq!(client.calls.load(Ordering::SeqCst), 10);

    let latency = report.latency.unwrap();
    assert!(latency.p50_ms <= latency.p90_ms);
    assert!(latency.p90_ms <= latency.p95_ms);
    assert!(latency.p95_ms <= latency.p99_ms);
    assert!(latency.mean_ms > 0.0);
}

#[tokio::test]
async fn test_malformed_line_is_counted_and_skipped() {
    let client = Arc::new(MockClient::default());
    let runner = runner_with(client.clone(), 2);
    let input = format!("this is not json\n{}", good_lines(9));

    let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    assert_eq!(report.total, 10);
    assert_eq!(report.count(OutcomeKind::MalformedInput), 1);
    assert_eq!(report.succeeded, 9);
    assert_eq!(report.failed, 1);
    assert_eq!(report.requests_issued, 9);
    assert_eq!(client.calls.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_no_valid_lines() {
    let client = Arc::new(MockClient::default());
    let runner = runner_with(client.clone(), 2);

    for input in ["", "\n  \n\n"] {
        let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.requests_issued, 0);
        assert!(report.latency.is_none());
        assert!(report.throughput.is_finite());
        assert!(report.to_string().contains("No requests were issued"));
    }

    let report = runner
        .run(InputReader::new("[1]\nnope\n".as_bytes()))
        .await
        .unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.requests_issued, 0);
    assert!(report.latency.is_none());
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_are_classified() {
    let client = Arc::new(MockClient::default());
    let runner = runner_with(client, 3);
    let input = concat!(
        "{\"NAME_FULL\": \"ok\"}\n",
        "{\"status\": 400}\n",
        "{\"status\": 503}\n",
        "{\"status\": 503}\n",
        "{\"timeout\": true}\n",
        "{\"garbage\": true}\n",
    );

    let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    assert_eq!(report.total, 6);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.count(OutcomeKind::HttpError), 3);
    assert_eq!(report.count(OutcomeKind::Timeout), 1);
    assert_eq!(report.count(OutcomeKind::MalformedResponse), 1);
    assert_eq!(report.http_statuses.get(&503), Some(&2));
    assert_eq!(report.http_statuses.get(&400), Some(&1));
    // Failed requests still carry latency
    assert_eq!(report.requests_issued, 6);
    assert!(report.latency.is_some());
}

#[tokio::test]
async fn test_in_flight_requests_bounded_by_workers() {
    let client = Arc::new(MockClient::with_delay(Duration::from_millis(10)));
    let runner = runner_with(client.clone(), 3);
    let input = good_lines(20);

    let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    assert_eq!(report.succeeded, 20);
    assert!(client.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_progress_every_interval() {
    let client = Arc::new(MockClient::default());
    let seen: Arc<Mutex<Vec<ProgressSnapshot>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let runner = RunnerBuilder::new()
        .workers(2)
        .report_interval(3)
        .client(client)
        .on_progress(move |snapshot| sink.lock().unwrap().push(*snapshot))
        .build()
        .unwrap();

    let input = good_lines(10);
    runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    let completed: Vec<u64> = seen.lock().unwrap().iter().map(|s| s.completed).collect();
    assert_eq!(completed, vec![3, 6, 9]);
}

#[tokio::test]
async fn test_single_slot_record_channel() {
    let client = Arc::new(MockClient::default());
    let runner = RunnerBuilder::new()
        .workers(4)
        .client(client)
        .channel_config(ChannelConfig::new(0))
        .build()
        .unwrap();
    let input = good_lines(25);

    let report = runner.run(InputReader::new(input.as_bytes())).await.unwrap();

    assert_eq!(report.total, 25);
    assert_eq!(report.succeeded, 25);
}

#[tokio::test]
async fn test_missing_input_file() {
    let runner = runner_with(Arc::new(MockClient::default()), 1);
    let err = runner
        .run_file(Path::new("/no/such/input.jsonl"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::InputUnavailable { .. }));
    assert_eq!(err.exit_code(), 2);
}
