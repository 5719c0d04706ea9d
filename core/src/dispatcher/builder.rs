//! Builder pattern for Dispatcher construction

use std::sync::Arc;

use crate::config::{ConfigError, DispatcherConfig};
use crate::engine::{EngineSlot, SearchEngine};

use super::executor::Dispatcher;

/// Builder for creating a Dispatcher with proper configuration
///
/// # Example
///
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .workers(4)
///     .instance_name("sz_search")
///     .engine(engine)
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    engine: Option<Arc<dyn SearchEngine>>,
}

impl DispatcherBuilder {
    /// Create a new dispatcher builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
            engine: None,
        }
    }

    /// Set the full dispatcher configuration
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker pool size
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the engine instance name
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.config.instance_name = name.into();
        self
    }

    /// Pre-install an engine handle
    ///
    /// Without one the dispatcher starts unready; the engine can still be
    /// installed later, exactly once.
    pub fn engine(mut self, engine: Arc<dyn SearchEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        self.config.validate()?;

        let slot = match self.engine {
            Some(engine) => EngineSlot::with_engine(engine),
            None => EngineSlot::new(),
        };

        Ok(Dispatcher::new(self.config, Arc::new(slot)))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
