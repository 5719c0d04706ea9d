//! Dispatcher for concurrent batch search
//!
//! The Dispatcher turns one search request into engine calls:
//! - Parsing the body into a single query or a `searches` batch
//! - Running each query on a bounded pool of blocking workers
//! - Isolating per-query failures and panics from their siblings
//! - Reassembling results in input order and shaping the response
//!
//! # Example
//!
//! ```ignore
//! use sz_search_core::{DispatcherBuilder, MemoryEngineFactory};
//!
//! let dispatcher = DispatcherBuilder::new().workers(4).build()?;
//! dispatcher.initialize_engine(&MemoryEngineFactory, config_json)?;
//!
//! let response = dispatcher.handle(body, Some("SEARCH_INCLUDE_STATS"), None).await;
//! ```

mod builder;
mod executor;
mod pool;

pub use builder::DispatcherBuilder;
pub use executor::{Dispatcher, HealthReport, HealthStatus};
pub use pool::{Admission, PoolError, WorkerPool};
