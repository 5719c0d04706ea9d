//! Builder pattern for Runner construction

use std::sync::Arc;

use crate::channel::ChannelConfig;
use crate::client::{HttpSearchClient, SearchClient};
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::stats::ProgressSnapshot;

use super::executor::{ProgressHook, Runner};

/// Builder for creating a Runner with proper configuration
///
/// # Example
///
/// ```ignore
/// let runner = RunnerBuilder::new()
///     .url("http://localhost:5000/search")
///     .workers(8)
///     .report_interval(500)
///     .on_progress(|snapshot| println!("{snapshot}"))
///     .build()?;
///
/// let report = runner.run_file(path).await?;
/// ```
pub struct RunnerBuilder {
    config: HarnessConfig,
    client: Option<Arc<dyn SearchClient>>,
    channel_config: ChannelConfig,
    progress: Option<ProgressHook>,
}

impl RunnerBuilder {
    /// Create a new runner builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            client: None,
            channel_config: ChannelConfig::default(),
            progress: None,
        }
    }

    /// Set the full harness configuration
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the target URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the progress interval
    pub fn report_interval(mut self, interval: u64) -> Self {
        self.config.report_interval = interval;
        self
    }

    /// Use a custom client instead of HTTP
    pub fn client(mut self, client: Arc<dyn SearchClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Receive a snapshot every `report_interval` completions
    pub fn on_progress<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(hook));
        self
    }

    /// Build the runner
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> HarnessResult<Runner> {
        self.config.validate()?;

        let client = match self.client {
            Some(client) => client,
            None => Arc::new(HttpSearchClient::new(
                self.config.url.clone(),
                self.config.timeout,
            )?),
        };

        Ok(Runner::new(
            self.config,
            client,
            self.channel_config,
            self.progress,
        ))
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
