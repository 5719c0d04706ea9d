//! Runner for load-test execution
//!
//! The Runner replays a line-delimited JSON file against the search API:
//! - Reading input lazily and classifying each line
//! - Bounding in-flight requests with a semaphore acquired before spawn
//! - Streaming every completion to a single aggregator task
//! - Emitting progress snapshots and building the final report
//!
//! # Example
//!
//! ```ignore
//! use sz_search_perftest::RunnerBuilder;
//!
//! let runner = RunnerBuilder::new()
//!     .url("http://localhost:5000/search")
//!     .workers(8)
//!     .build()?;
//!
//! let report = runner.run_file(Path::new("queries.jsonl")).await?;
//! println!("{report}");
//! ```

mod aggregator;
mod builder;
mod executor;

pub use builder::RunnerBuilder;
pub use executor::{ProgressHook, Runner};

#[cfg(test)]
mod tests;
