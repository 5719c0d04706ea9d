//! Record aggregation

use std::time::Instant;

use tokio::sync::mpsc;

use crate::metrics::RequestRecord;
use crate::stats::RunningStats;

use super::executor::ProgressHook;

/// Drain `records` into running statistics until every sender is dropped
///
/// Emits a progress snapshot every `report_interval` records.
pub(crate) async fn aggregate_records(
    mut records: mpsc::Receiver<RequestRecord>,
    started: Instant,
    report_interval: u64,
    progress: Option<ProgressHook>,
) -> RunningStats {
    let mut stats = RunningStats::new(started);

    while let Some(record) = records.recv().await {
        stats.record(&record);

        if stats.total() % report_interval == 0 {
            let snapshot = stats.snapshot();
            tracing::debug!(
                completed = snapshot.completed,
                errors = snapshot.errors,
                throughput = snapshot.throughput,
                "Progress"
            );
            if let Some(hook) = &progress {
                hook(&snapshot);
            }
        }
    }

    stats
}
