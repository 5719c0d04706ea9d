//! sz-search-perftest: concurrent load harness for the search API
//!
//! Replays a line-delimited JSON file against `/search` with a bounded
//! number of requests in flight, classifies every outcome and reports
//! throughput and latency percentiles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod metrics;
pub mod outcome;
pub mod runner;
pub mod stats;

pub use channel::ChannelConfig;
pub use client::{HttpSearchClient, SearchClient};
pub use config::{HarnessConfig, PerfTestArgs};
pub use error::{HarnessError, HarnessResult};
pub use input::{InputItem, InputReader, Payload};
pub use metrics::{LatencyHistogram, LatencySummary, RequestRecord};
pub use outcome::{Outcome, OutcomeKind};
pub use runner::{ProgressHook, Runner, RunnerBuilder};
pub use stats::{FinalReport, ProgressSnapshot, RunInfo, RunningStats};
