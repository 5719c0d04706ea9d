//! sz-search-core: engine seam and concurrent batch dispatcher
//!
//! This crate provides the pieces the search service is built from,
//! including:
//!
//! - The synchronous engine traits and the one-shot engine slot
//! - The query model and request-body parsing (single or `searches` batch)
//! - The bounded worker pool and the order-preserving dispatcher
//! - The engine error taxonomy and its HTTP status mapping

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod flags;
pub mod query;
pub mod result;

pub use config::{ConfigError, DispatcherConfig};
pub use dispatcher::{
    Admission, Dispatcher, DispatcherBuilder, HealthReport, HealthStatus, PoolError, WorkerPool,
};
pub use engine::{EngineFactory, EngineSlot, MemoryEngine, MemoryEngineFactory, SearchEngine};
pub use error::{EngineError, EngineErrorKind, InitError};
pub use flags::{SearchFlags, UnknownFlag};
pub use query::{Query, QueryBatch, RequestError, RequestShape};
pub use result::{BatchResult, DispatchResponse, FailureKind, QueryFailure, QueryResult};
