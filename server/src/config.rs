//! Server configuration types

use clap::Args;
use sz_search_core::config::DEFAULT_INSTANCE_NAME;
use sz_search_core::DispatcherConfig;

use crate::error::ServerError;
use crate::state::DEFAULT_MAX_BODY_BYTES;

/// Environment variable carrying the engine configuration JSON
pub const ENGINE_CONFIG_ENV: &str = "SENZING_ENGINE_CONFIGURATION_JSON";

/// Server configuration
///
/// Every option can also be supplied through the environment, which is
/// how container deployments configure the service.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Engine configuration JSON
    #[arg(long = "engine-config", env = ENGINE_CONFIG_ENV, hide_env_values = true)]
    pub engine_config: Option<String>,

    /// Engine instance name
    #[arg(long, default_value = DEFAULT_INSTANCE_NAME)]
    pub instance_name: String,

    /// Number of engine calls allowed to run at once
    #[arg(long, env = "SENZING_THREADS_PER_PROCESS", default_value_t = 1)]
    pub workers: usize,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Largest accepted `/search` request body, in bytes
    #[arg(long, env = "SZ_SEARCH_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Enable debug logging
    #[arg(long, env = "SZ_SEARCH_DEBUG")]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            engine_config: None,
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            workers: 1,
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Set the engine configuration JSON
    pub fn with_engine_config(mut self, json: impl Into<String>) -> Self {
        self.engine_config = Some(json.into());
        self
    }

    /// Dispatcher settings derived from this configuration
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::new(self.workers).with_instance_name(self.instance_name.clone())
    }

    /// Engine configuration JSON, which must be present and non-blank
    pub fn engine_config(&self) -> Result<&str, ServerError> {
        self.engine_config
            .as_deref()
            .map(str::trim)
            .filter(|json| !json.is_empty())
            .ok_or(ServerError::MissingEngineConfig)
    }

    /// `host:port` to bind; the host may be a name or an IP literal
    pub fn bind_addr(&self) -> Result<String, ServerError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ServerError::InvalidAddress(format!(":{}", self.port)));
        }
        Ok(format!("{host}:{}", self.port))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        self.engine_config()?;
        self.dispatcher_config().validate()?;
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ServerError::InvalidBodyLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.port, 5000);
        assert_eq!(config.instance_name, "sz_search");
        assert_eq!(config.bind_addr().unwrap(), "0.0.0.0:5000");
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_missing_engine_config_is_fatal() {
        let config = ServerConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ServerError::MissingEngineConfig)
        ));

        let blank = ServerConfig::default().with_engine_config("   ");
        assert!(matches!(
            blank.validate(),
            Err(ServerError::MissingEngineConfig)
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig::default().with_engine_config("{}");
        assert!(config.validate().is_ok());

        let zero = ServerConfig {
            workers: 0,
            ..config.clone()
        };
        assert!(matches!(zero.validate(), Err(ServerError::Config(_))));

        let blank_host = ServerConfig {
            host: " ".into(),
            ..config
        };
        assert!(matches!(
            blank_host.validate(),
            Err(ServerError::InvalidAddress(_))
        ));

        let no_body = ServerConfig {
            max_body_bytes: 0,
            ..ServerConfig::default().with_engine_config("{}")
        };
        assert!(matches!(no_body.validate(), Err(ServerError::InvalidBodyLimit)));
    }
}
