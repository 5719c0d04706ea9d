//! Server error types

use sz_search_core::ConfigError;
use thiserror::Error;

/// Errors that stop the server from starting or serving
#[derive(Debug, Error)]
pub enum ServerError {
    /// No engine configuration was supplied
    #[error("engine configuration is required (set SENZING_ENGINE_CONFIGURATION_JSON or --engine-config)")]
    MissingEngineConfig,

    /// Dispatcher settings rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Host and port do not form a socket address
    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    /// Request body limit must allow at least one byte
    #[error("request body limit must be at least 1 byte")]
    InvalidBodyLimit,

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
