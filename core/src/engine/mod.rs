//! Resolution engine seam
//!
//! The engine is an external, synchronous collaborator. This module defines
//! the traits the dispatcher calls through and the one-shot slot that holds
//! the process-wide handle.
//!
//! The handle is installed exactly once, before any traffic is accepted,
//! and is then read concurrently by every query execution without locking.

pub mod memory;

use crate::error::{EngineError, InitError};
use crate::flags::SearchFlags;

use std::sync::{Arc, OnceLock};

pub use memory::{MemoryEngine, MemoryEngineFactory};

/// Synchronous search engine shared by all query executions
///
/// Implementations must tolerate concurrent calls from many threads; a
/// search call never mutates shared engine state.
pub trait SearchEngine: Send + Sync {
    /// Resolve `attributes` (a JSON object) and return the raw JSON answer
    fn search(
        &self,
        attributes: &str,
        flags: SearchFlags,
        profile: Option<&str>,
    ) -> Result<String, EngineError>;

    /// Trivial liveness probe used by health checks
    fn probe(&self) -> Result<(), EngineError>;
}

/// Creates engine handles from an instance name and configuration JSON
pub trait EngineFactory: Send + Sync {
    /// Factory name for logs
    fn name(&self) -> &str;

    /// Initialize a new engine handle
    fn init(&self, instance_name: &str, config_json: &str)
        -> Result<Arc<dyn SearchEngine>, InitError>;
}

/// Write-once holder for the process-wide engine handle
#[derive(Default)]
pub struct EngineSlot {
    handle: OnceLock<Arc<dyn SearchEngine>>,
}

impl EngineSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already holds `engine`
    pub fn with_engine(engine: Arc<dyn SearchEngine>) -> Self {
        let slot = Self::new();
        let _ = slot.handle.set(engine);
        slot
    }

    /// Install the handle; fails if one is already present
    pub fn install(&self, engine: Arc<dyn SearchEngine>) -> Result<(), InitError> {
        self.handle
            .set(engine)
            .map_err(|_| InitError::AlreadyInitialized)
    }

    /// Run `factory` and install its handle
    pub fn initialize(
        &self,
        factory: &dyn EngineFactory,
        instance_name: &str,
        config_json: &str,
    ) -> Result<(), InitError> {
        if self.is_ready() {
            return Err(InitError::AlreadyInitialized);
        }
        let engine = factory.init(instance_name, config_json)?;
        self.install(engine)?;
        tracing::info!(
            factory = factory.name(),
            instance = instance_name,
            "Search engine initialized"
        );
        Ok(())
    }

    /// The installed handle, if any
    pub fn get(&self) -> Option<Arc<dyn SearchEngine>> {
        self.handle.get().cloned()
    }

    /// Whether a handle is installed
    pub fn is_ready(&self) -> bool {
        self.handle.get().is_some()
    }
}

impl std::fmt::Debug for EngineSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}
