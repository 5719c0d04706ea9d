//! Dispatcher execution logic

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::config::DispatcherConfig;
use crate::engine::{EngineFactory, EngineSlot, SearchEngine};
use crate::error::{EngineError, InitError};
use crate::flags::SearchFlags;
use crate::query::{Query, QueryBatch};
use crate::result::{BatchResult, DispatchResponse, QueryResult};

use super::pool::{Admission, PoolError, WorkerPool};

/// Liveness of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Engine present and responsive
    Healthy,
    /// Engine absent or failing its probe
    Unhealthy,
}

/// Health check answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall status
    pub status: HealthStatus,
    /// Whether the engine handle is installed and answered its probe
    pub engine_ready: bool,
}

impl HealthReport {
    fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            engine_ready: true,
        }
    }

    fn unhealthy() -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            engine_ready: false,
        }
    }

    /// HTTP status for this report
    pub fn http_status(&self) -> u16 {
        match self.status {
            HealthStatus::Healthy => 200,
            HealthStatus::Unhealthy => 503,
        }
    }
}

/// Dispatcher fans search batches out to the engine and back in
///
/// Holds the process-wide engine slot and the worker pool that bounds how
/// many engine calls run at once.
pub struct Dispatcher {
    /// Dispatcher configuration
    pub(crate) config: DispatcherConfig,

    /// Engine handle slot (shared with whoever initializes the engine)
    pub(crate) slot: Arc<EngineSlot>,

    /// Pool running the blocking engine calls
    pub(crate) pool: WorkerPool,
}

impl Dispatcher {
    /// Create a new dispatcher
    ///
    /// Use `DispatcherBuilder` for a more ergonomic construction.
    pub fn new(config: DispatcherConfig, slot: Arc<EngineSlot>) -> Self {
        let pool = WorkerPool::new(config.workers);
        Self { config, slot, pool }
    }

    /// Get the dispatcher configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Worker pool size
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Whether an engine handle is installed
    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    /// Install an already-built engine handle
    pub fn install_engine(&self, engine: Arc<dyn SearchEngine>) -> Result<(), InitError> {
        self.slot.install(engine)
    }

    /// Initialize the engine through `factory` using the configured instance name
    pub fn initialize_engine(
        &self,
        factory: &dyn EngineFactory,
        config_json: &str,
    ) -> Result<(), InitError> {
        self.slot
            .initialize(factory, &self.config.instance_name, config_json)
    }

    /// Execute every query of `batch` and collect results in input order
    ///
    /// Fails only when no engine handle is installed; per-query failures are
    /// carried inside the returned [`BatchResult`].
    pub async fn dispatch(&self, batch: QueryBatch) -> Result<BatchResult, EngineError> {
        let engine = self.slot.get().ok_or_else(EngineError::not_initialized)?;

        let start = Instant::now();
        let shape = batch.shape();
        let queries = batch.into_queries();
        let count = queries.len();

        let mut slots: Vec<Option<QueryResult>> = (0..count).map(|_| None).collect();

        // Slots are admitted in index order; only execution overlaps
        let mut tasks = JoinSet::new();
        for (index, query) in queries.into_iter().enumerate() {
            let admission = match self.pool.admit().await {
                Ok(admission) => admission,
                Err(e) => {
                    tracing::error!(error = %e, index, "Search could not be admitted");
                    slots[index] = Some(QueryResult::unexpected(e.to_string()));
                    continue;
                }
            };
            let engine = Arc::clone(&engine);
            tasks.spawn(async move { (index, execute(admission, engine, query).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Search task failed to complete"),
            }
        }

        let results: Vec<QueryResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    QueryResult::unexpected(format!("search {index} did not complete"))
                })
            })
            .collect();

        let batch = BatchResult::new(results, shape);
        tracing::debug!(
            queries = count,
            failures = batch.failure_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch dispatched"
        );
        Ok(batch)
    }

    /// Handle one raw search request end to end
    ///
    /// `flags` is the pipe-separated flag expression and `profile` the
    /// optional profile name, both taken from the request query string.
    pub async fn handle(
        &self,
        body: &[u8],
        flags: Option<&str>,
        profile: Option<&str>,
    ) -> DispatchResponse {
        if !self.is_ready() {
            let err = EngineError::not_initialized();
            tracing::warn!("Rejecting search: engine not initialized");
            return DispatchResponse::error(err.http_status(), &err.message);
        }

        let flags = match SearchFlags::parse(flags) {
            Ok(flags) => flags,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting search flags");
                return DispatchResponse::error(400, &e.to_string());
            }
        };

        let profile = profile.map(str::trim).filter(|p| !p.is_empty());
        let batch = match QueryBatch::parse(body, flags, profile) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting search body");
                return DispatchResponse::bad_request(&e);
            }
        };

        match self.dispatch(batch).await {
            Ok(results) => results.into_response(),
            Err(e) => DispatchResponse::error(e.http_status(), &e.message),
        }
    }

    /// Report health, probing the engine off the async threads
    pub async fn health(&self) -> HealthReport {
        let Some(engine) = self.slot.get() else {
            return HealthReport::unhealthy();
        };

        match tokio::task::spawn_blocking(move || engine.probe()).await {
            Ok(Ok(())) => HealthReport::healthy(),
            Ok(Err(e)) => {
                tracing::warn!(kind = %e.kind, error = %e, "Engine probe failed");
                HealthReport::unhealthy()
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine probe panicked");
                HealthReport::unhealthy()
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("slot", &self.slot)
            .finish()
    }
}

async fn execute(admission: Admission, engine: Arc<dyn SearchEngine>, query: Query) -> QueryResult {
    let outcome = admission
        .run(move || engine.search(query.attributes(), query.flags(), query.profile()))
        .await;

    match outcome {
        Ok(Ok(answer)) => QueryResult::from_engine_output(answer),
        Ok(Err(e)) => {
            if e.kind.is_client_error() {
                tracing::debug!(kind = %e.kind, error = %e, "Search rejected by engine");
            } else {
                tracing::warn!(kind = %e.kind, error = %e, "Search failed in engine");
            }
            QueryResult::engine_failure(e)
        }
        Err(PoolError::Panicked(message)) => {
            tracing::error!(panic = %message, "Search worker panicked");
            QueryResult::unexpected(format!("internal error during search: {message}"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Search could not be executed");
            QueryResult::unexpected(e.to_string())
        }
    }
}
