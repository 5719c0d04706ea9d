//! Harness configuration types

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::error::{HarnessError, HarnessResult};

/// Default search endpoint
pub const DEFAULT_TARGET_URL: &str = "http://localhost:5000/search";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Default number of completions between progress snapshots
pub const DEFAULT_REPORT_INTERVAL: u64 = 1000;

/// Environment variable overriding the default worker count
pub const WORKERS_ENV: &str = "SENZING_THREADS_PER_PROCESS";

/// Harness run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Search endpoint every line is posted to
    pub url: String,

    /// Maximum number of requests in flight
    pub workers: usize,

    /// Per-request timeout
    pub timeout: Duration,

    /// Completions between progress snapshots
    pub report_interval: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.to_string(),
            workers: default_workers(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

impl HarnessConfig {
    /// Create a config targeting `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the progress interval
    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> HarnessResult<()> {
        if self.workers == 0 {
            return Err(HarnessError::Config(
                "workers must be at least 1".into(),
            ));
        }

        if self.report_interval == 0 {
            return Err(HarnessError::Config(
                "report interval must be at least 1".into(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(HarnessError::Config("timeout must be positive".into()));
        }

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(HarnessError::Config(format!(
                "target URL must be http(s): {}",
                self.url
            )));
        }

        Ok(())
    }
}

/// Worker count used when none is configured
///
/// Reads `SENZING_THREADS_PER_PROCESS`, falling back to the available
/// parallelism of the host.
pub fn default_workers() -> usize {
    std::env::var(WORKERS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
}

/// Command-line arguments of the `perftest` subcommand
#[derive(Debug, Clone, Args)]
pub struct PerfTestArgs {
    /// Line-delimited JSON file, one search per line
    pub input: PathBuf,

    /// Search endpoint
    #[arg(long, default_value = DEFAULT_TARGET_URL)]
    pub url: String,

    /// Maximum requests in flight [default: SENZING_THREADS_PER_PROCESS or CPU count]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Completed requests between progress reports
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL)]
    pub report_interval: u64,

    /// Also write the final report as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

impl PerfTestArgs {
    /// Harness configuration described by these arguments
    ///
    /// A non-finite or non-positive timeout maps to zero and is rejected by
    /// [`HarnessConfig::validate`].
    pub fn harness_config(&self) -> HarnessConfig {
        let timeout = Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::ZERO);
        HarnessConfig {
            url: self.url.clone(),
            workers: self.workers.unwrap_or_else(default_workers),
            timeout,
            report_interval: self.report_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(workers: Option<usize>, timeout: f64) -> PerfTestArgs {
        PerfTestArgs {
            input: PathBuf::from("queries.jsonl"),
            url: DEFAULT_TARGET_URL.to_string(),
            workers,
            timeout,
            report_interval: DEFAULT_REPORT_INTERVAL,
            json: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.url, "http://localhost:5000/search");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.report_interval, 1000);
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = HarnessConfig::new("http://custom:8080/search")
            .with_workers(5)
            .with_timeout(Duration::from_secs(60))
            .with_report_interval(500);

        assert_eq!(config.url, "http://custom:8080/search");
        assert_eq!(config.workers, 5);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.report_interval, 500);
    }

    #[test]
    fn test_config_validation() {
        assert!(HarnessConfig::default().with_workers(0).validate().is_err());
        assert!(HarnessConfig::default()
            .with_report_interval(0)
            .validate()
            .is_err());
        assert!(HarnessConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(HarnessConfig::new("ftp://example.com").validate().is_err());
    }

    #[test]
    fn test_args_map_to_config() {
        let config = args(Some(7), 2.5).harness_config();
        assert_eq!(config.workers, 7);
        assert_eq!(config.timeout, Duration::from_millis(2500));

        let negative = args(Some(1), -1.0).harness_config();
        assert!(negative.validate().is_err());
    }
}
