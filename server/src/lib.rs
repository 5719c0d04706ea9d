//! sz-search-server: HTTP surface for the search dispatcher
//!
//! Wires configuration, engine start-up and the axum router together.
//! An engine that fails to initialize does not stop the server: it keeps
//! serving, reports itself unhealthy and answers every search with 503.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use sz_search_core::{Dispatcher, DispatcherBuilder, EngineFactory, MemoryEngineFactory};
use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::router;
pub use state::{AppState, DEFAULT_MAX_BODY_BYTES};

/// Router serving `dispatcher`
pub fn app(dispatcher: Arc<Dispatcher>) -> axum::Router {
    router(AppState::new(dispatcher))
}

/// Build the dispatcher and try to bring up its engine
///
/// Fails only on invalid configuration; an engine initialization error is
/// logged and leaves the dispatcher unready.
pub fn build_dispatcher(
    config: &ServerConfig,
    factory: &dyn EngineFactory,
) -> Result<Arc<Dispatcher>, ServerError> {
    config.validate()?;
    let engine_config = config.engine_config()?;

    let dispatcher = DispatcherBuilder::new()
        .config(config.dispatcher_config())
        .build()?;

    match dispatcher.initialize_engine(factory, engine_config) {
        Ok(()) => tracing::info!(
            instance = %config.instance_name,
            workers = config.workers,
            "Dispatcher ready"
        ),
        Err(e) => tracing::error!(
            error = %e,
            instance = %config.instance_name,
            "Engine initialization failed; serving unhealthy"
        ),
    }

    Ok(Arc::new(dispatcher))
}

/// Serve `state` on an already-bound listener until `shutdown` resolves
pub async fn serve_on<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Run the server with the bundled in-memory engine until Ctrl+C
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let dispatcher = build_dispatcher(&config, &MemoryEngineFactory)?;

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let state = AppState::new(dispatcher).with_max_body_bytes(config.max_body_bytes);
    serve_on(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
