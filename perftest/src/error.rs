//! Error types for the load harness

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a run from starting or completing
///
/// Per-request failures are never errors at this level; they are counted
/// in the report.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The input source could not be opened
    #[error("input file {} cannot be opened: {source}", .path.display())]
    InputUnavailable {
        /// Requested input path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client could not be constructed
    #[error("client error: {0}")]
    Client(String),

    /// Internal task failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl HarnessError {
    /// Process exit code for this error
    ///
    /// An unreadable input yields 2; anything else that prevents a run is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarnessError::InputUnavailable { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
