//! Harness runs against a live server backed by the in-memory engine

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::Router;
use sz_search_core::{DispatcherBuilder, MemoryEngineFactory};
use sz_search_perftest::{OutcomeKind, RunnerBuilder};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

const ENGINE_CONFIG: &str = r#"{
    "records": [
        {"DATA_SOURCE": "CUSTOMERS", "RECORD_ID": "1001", "NAME_FULL": "Robert Smith", "PHONE_NUMBER": "555-1212"},
        {"DATA_SOURCE": "CUSTOMERS", "RECORD_ID": "1002", "NAME_FULL": "Jane Doe"},
        {"DATA_SOURCE": "WATCHLIST", "RECORD_ID": "W1", "NAME_FULL": "Robert Smith"}
    ]
}"#;

/// Start a server on an ephemeral port and return its search URL
async fn spawn_server(workers: usize) -> String {
    let dispatcher = DispatcherBuilder::new().workers(workers).build().unwrap();
    dispatcher
        .initialize_engine(&MemoryEngineFactory, ENGINE_CONFIG)
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = sz_search_server::app(Arc::new(dispatcher));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/search")
}

/// Serve `router` on an ephemeral port and return the URL of `path`
async fn spawn_router(router: Router, path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}{path}")
}

fn input_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_replay_against_live_server() {
    let url = spawn_server(2).await;
    let file = input_file(&[
        r#"{"NAME_FULL": "Robert Smith"}"#,
        r#"{"NAME_FULL": "Jane Doe"}"#,
        r#"{"PHONE_NUMBER": "555-1212"}"#,
        r#"{"NAME_FULL": "Nobody Known"}"#,
        "",
        r#"{"NAME_FULL": "Robert Smith", "DATA_SOURCE": "WATCHLIST"}"#,
    ]);

    let runner = RunnerBuilder::new().url(url).workers(3).build().unwrap();
    let report = runner.run_file(file.path()).await.unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 5);
    assert_eq!(report.failed, 0);
    assert_eq!(report.requests_issued, 5);
    assert!(report.latency.is_some());
    assert!(report.throughput > 0.0);
}

#[tokio::test]
async fn test_server_rejections_are_http_errors() {
    let url = spawn_server(1).await;
    let file = input_file(&[
        r#"{"NAME_FULL": "Robert Smith"}"#,
        // No searchable features
        r#"{"DATA_SOURCE": "CUSTOMERS"}"#,
        r#"{"NAME_FULL": "Jane Doe", "DATA_SOURCE": "NOWHERE"}"#,
        "not json at all",
    ]);

    let runner = RunnerBuilder::new().url(url).workers(2).build().unwrap();
    let report = runner.run_file(file.path()).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.count(OutcomeKind::MalformedInput), 1);
    assert_eq!(report.count(OutcomeKind::HttpError), 2);
    assert_eq!(report.http_statuses.values().sum::<u64>(), 2);
    assert!(report.http_statuses.keys().all(|status| (400..500).contains(status)));
    assert_eq!(report.requests_issued, 3);
}

#[tokio::test]
async fn test_unreachable_server_counts_transport_failures() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let file = input_file(&[r#"{"NAME_FULL": "Robert Smith"}"#, r#"{"NAME_FULL": "Jane Doe"}"#]);
    let config = sz_search_perftest::HarnessConfig::new(format!("http://{addr}/search"))
        .with_workers(2)
        .with_timeout(Duration::from_secs(5));
    let runner = RunnerBuilder::new().config(config).build().unwrap();
    let report = runner.run_file(file.path()).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 0);
    assert_eq!(
        report.count(OutcomeKind::Transport) + report.count(OutcomeKind::Timeout),
        2
    );
}

#[tokio::test]
async fn test_slow_server_counts_timeouts() {
    let router = Router::new().route(
        "/slow",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "{}"
        }),
    );
    let url = spawn_router(router, "/slow").await;

    let file = input_file(&[r#"{"NAME_FULL": "Robert Smith"}"#]);
    let config = sz_search_perftest::HarnessConfig::new(url)
        .with_workers(1)
        .with_timeout(Duration::from_millis(300));
    let runner = RunnerBuilder::new().config(config).build().unwrap();
    let report = runner.run_file(file.path()).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.count(OutcomeKind::Timeout), 1);
    assert_eq!(report.count(OutcomeKind::Transport), 0);
    assert_eq!(report.requests_issued, 1);
}

#[tokio::test]
async fn test_non_json_success_is_malformed_response() {
    let router = Router::new().route("/text", post(|| async { "not json" }));
    let url = spawn_router(router, "/text").await;

    let file = input_file(&[r#"{"NAME_FULL": "Robert Smith"}"#, r#"{"NAME_FULL": "Jane Doe"}"#]);
    let runner = RunnerBuilder::new().url(url).workers(2).build().unwrap();
    let report = runner.run_file(file.path()).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.count(OutcomeKind::MalformedResponse), 2);
    assert_eq!(report.success_rate, Some(0.0));
}
