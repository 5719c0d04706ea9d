//! Engine error taxonomy and its HTTP status mapping

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of errors raised by the resolution engine
///
/// Every kind maps to exactly one HTTP status via [`EngineErrorKind::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// Malformed or semantically invalid search attributes
    BadInput,
    /// Attributes reference a data source the engine does not know
    UnknownDataSource,
    /// The requested entity or record does not exist
    NotFound,
    /// Engine configuration is missing or invalid
    Configuration,
    /// Engine license is missing or exhausted
    License,
    /// Backing database reported an error
    Database,
    /// Connection to the backing database was lost
    DatabaseConnectionLost,
    /// Backing database reported a transient failure
    DatabaseTransient,
    /// The engine handle has not been initialized
    NotInitialized,
    /// The engine hit an unrecoverable internal state
    Unrecoverable,
    /// Any other engine error
    Unhandled,
}

impl EngineErrorKind {
    /// HTTP status returned to API callers for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            EngineErrorKind::BadInput | EngineErrorKind::UnknownDataSource => 400,
            EngineErrorKind::NotFound => 404,
            EngineErrorKind::Configuration
            | EngineErrorKind::License
            | EngineErrorKind::Database
            | EngineErrorKind::DatabaseConnectionLost
            | EngineErrorKind::DatabaseTransient
            | EngineErrorKind::NotInitialized => 503,
            EngineErrorKind::Unrecoverable | EngineErrorKind::Unhandled => 500,
        }
    }

    /// Whether the failure is attributable to the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineErrorKind::BadInput => "bad_input",
            EngineErrorKind::UnknownDataSource => "unknown_data_source",
            EngineErrorKind::NotFound => "not_found",
            EngineErrorKind::Configuration => "configuration",
            EngineErrorKind::License => "license",
            EngineErrorKind::Database => "database",
            EngineErrorKind::DatabaseConnectionLost => "database_connection_lost",
            EngineErrorKind::DatabaseTransient => "database_transient",
            EngineErrorKind::NotInitialized => "not_initialized",
            EngineErrorKind::Unrecoverable => "unrecoverable",
            EngineErrorKind::Unhandled => "unhandled",
        };
        f.write_str(name)
    }
}

/// Error returned by a single engine call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Error classification
    pub kind: EngineErrorKind,
    /// Engine-provided message, surfaced to API callers verbatim
    pub message: String,
}

impl EngineError {
    /// Create a new engine error
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`EngineErrorKind::BadInput`]
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::BadInput, message)
    }

    /// Shorthand for [`EngineErrorKind::NotFound`]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound, message)
    }

    /// Shorthand for [`EngineErrorKind::NotInitialized`]
    pub fn not_initialized() -> Self {
        Self::new(
            EngineErrorKind::NotInitialized,
            "search engine is not initialized",
        )
    }

    /// HTTP status for this error
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// Errors raised while creating an engine handle
#[derive(Debug, Error)]
pub enum InitError {
    /// Configuration JSON rejected by the engine
    #[error("invalid engine configuration: {0}")]
    Configuration(String),

    /// An engine handle was already installed
    #[error("engine handle is already initialized")]
    AlreadyInitialized,

    /// Engine-specific failure during start-up
    #[error("engine initialization failed: {0}")]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_per_row() {
        assert_eq!(EngineErrorKind::BadInput.http_status(), 400);
        assert_eq!(EngineErrorKind::NotFound.http_status(), 404);
        assert_eq!(EngineErrorKind::Configuration.http_status(), 503);
        assert_eq!(EngineErrorKind::Database.http_status(), 503);
        assert_eq!(EngineErrorKind::NotInitialized.http_status(), 503);
        assert_eq!(EngineErrorKind::Unhandled.http_status(), 500);
    }

    #[test]
    fn test_status_mapping_subtypes() {
        assert_eq!(EngineErrorKind::UnknownDataSource.http_status(), 400);
        assert_eq!(EngineErrorKind::License.http_status(), 503);
        assert_eq!(EngineErrorKind::DatabaseConnectionLost.http_status(), 503);
        assert_eq!(EngineErrorKind::DatabaseTransient.http_status(), 503);
        assert_eq!(EngineErrorKind::Unrecoverable.http_status(), 500);
    }

    #[test]
    fn test_client_error_classification() {
        assert!(EngineErrorKind::BadInput.is_client_error());
        assert!(EngineErrorKind::NotFound.is_client_error());
        assert!(!EngineErrorKind::Database.is_client_error());
        assert!(!EngineErrorKind::Unhandled.is_client_error());
    }

    #[test]
    fn test_engine_error_display_is_message() {
        let err = EngineError::bad_input("missing NAME_FULL");
        assert_eq!(err.to_string(), "missing NAME_FULL");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_kind_snake_case_serialization() {
        assert_eq!(
            serde_json::to_string(&EngineErrorKind::DatabaseConnectionLost).unwrap(),
            "\"database_connection_lost\""
        );
        assert_eq!(EngineErrorKind::NotInitialized.to_string(), "not_initialized");
    }
}
