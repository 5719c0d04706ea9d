//! Runner execution logic

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::channel::ChannelConfig;
use crate::client::SearchClient;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::input::{InputReader, Payload};
use crate::metrics::RequestRecord;
use crate::outcome::Outcome;
use crate::stats::{FinalReport, ProgressSnapshot, RunInfo};

use super::aggregator::aggregate_records;

/// Callback receiving periodic progress snapshots
pub type ProgressHook = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Runner replays an input stream against a search client
///
/// Responsible for reading input, bounding in-flight requests, and
/// handing every completion to the aggregator.
pub struct Runner {
    /// Harness configuration
    pub(crate) config: HarnessConfig,

    /// Client shared by all request tasks
    pub(crate) client: Arc<dyn SearchClient>,

    /// Channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Optional progress callback
    pub(crate) progress: Option<ProgressHook>,
}

impl Runner {
    /// Create a new runner
    ///
    /// Use `RunnerBuilder` for a more ergonomic construction.
    pub fn new(
        config: HarnessConfig,
        client: Arc<dyn SearchClient>,
        channel_config: ChannelConfig,
        progress: Option<ProgressHook>,
    ) -> Self {
        Self {
            config,
            client,
            channel_config,
            progress,
        }
    }

    /// Get the harness configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Open `path` and run it to completion
    pub async fn run_file(&self, path: &Path) -> HarnessResult<FinalReport> {
        let input = InputReader::open(path).await?;
        tracing::info!(input = %path.display(), "Opened input");
        self.run(input).await
    }

    /// Run every item of `input` and return the final report
    ///
    /// Per-request failures never abort the run. A read error ends input
    /// early; requests already in flight still complete and are reported.
    pub async fn run<R>(&self, mut input: InputReader<R>) -> HarnessResult<FinalReport>
    where
        R: AsyncRead + Unpin,
    {
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            target_url = %self.client.target(),
            workers = self.config.workers,
            timeout_secs = self.config.timeout.as_secs_f64(),
            "Starting performance test"
        );

        let (records_tx, records_rx) = mpsc::channel(self.channel_config.records_buffer());
        let aggregator = tokio::spawn(aggregate_records(
            records_rx,
            start,
            self.config.report_interval,
            self.progress.clone(),
        ));

        let permits = Arc::new(Semaphore::new(self.config.workers));
        let mut in_flight = JoinSet::new();

        loop {
            let item = match input.next_item().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        line = input.lines_read() + 1,
                        "Failed to read input; finishing in-flight requests"
                    );
                    break;
                }
            };

            match item.payload {
                Payload::Malformed(reason) => {
                    tracing::warn!(line = item.line, %reason, "Skipping malformed input line");
                    send(&records_tx, RequestRecord::malformed_input()).await;
                }
                Payload::Query(body) => {
                    let permit = Arc::clone(&permits)
                        .acquire_owned()
                        .await
                        .map_err(|e| HarnessError::Internal(e.to_string()))?;
                    let client = Arc::clone(&self.client);
                    let tx = records_tx.clone();
                    let line = item.line;

                    in_flight.spawn(async move {
                        let _permit = permit;
                        let sent = Instant::now();
                        let outcome = client.search(body).await;
                        let latency = sent.elapsed();
                        if !outcome.is_success() {
                            tracing::debug!(line, %outcome, "Request failed");
                        }
                        send(&tx, RequestRecord::issued(outcome, latency)).await;
                    });
                }
            }

            while let Some(joined) = in_flight.try_join_next() {
                reap(joined, &records_tx).await;
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            reap(joined, &records_tx).await;
        }
        drop(records_tx);

        let stats = aggregator
            .await
            .map_err(|e| HarnessError::Internal(format!("aggregator failed: {e}")))?;

        let report = stats.finish(RunInfo {
            target: self.client.target().to_string(),
            workers: self.config.workers,
            started_at,
        });

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_secs = report.elapsed_secs,
            throughput = report.throughput,
            "Performance test completed"
        );

        Ok(report)
    }
}

async fn send(tx: &mpsc::Sender<RequestRecord>, record: RequestRecord) {
    if tx.send(record).await.is_err() {
        tracing::error!("Aggregator stopped; record dropped");
    }
}

async fn reap(
    joined: Result<(), tokio::task::JoinError>,
    records_tx: &mpsc::Sender<RequestRecord>,
) {
    if let Err(e) = joined {
        // The task died before reporting; count it so totals stay whole
        tracing::error!(error = %e, "Request task panicked");
        send(records_tx, RequestRecord { outcome: Outcome::Transport, latency: None }).await;
    }
}
