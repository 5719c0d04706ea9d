//! Dispatcher configuration types

use serde::{Deserialize, Serialize};

/// Default engine instance name
pub const DEFAULT_INSTANCE_NAME: &str = "sz_search";

/// Dispatcher configuration
///
/// Sizes the worker pool that runs blocking engine calls and names the
/// engine instance for initialization and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Maximum number of engine calls executing at once
    pub workers: usize,

    /// Engine instance name
    pub instance_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Create a new config with the given pool size
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Set the instance name
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            ));
        }

        if self.instance_name.trim().is_empty() {
            return Err(ConfigError::InvalidInstanceName(
                "instance name must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    /// Invalid instance name
    #[error("Invalid instance name: {0}")]
    InvalidInstanceName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.instance_name, "sz_search");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = DispatcherConfig::new(8).with_instance_name("resolver");
        assert_eq!(config.workers, 8);
        assert_eq!(config.instance_name, "resolver");
    }

    #[test]
    fn test_config_validation_zero_workers() {
        let config = DispatcherConfig::new(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers(_))
        ));
    }

    #[test]
    fn test_config_validation_blank_instance_name() {
        let config = DispatcherConfig::new(2).with_instance_name("  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInstanceName(_))
        ));
    }
}
