//! sz-search CLI
//!
//! `serve` runs the HTTP search service; `perftest` replays a query file
//! against it and reports throughput and latency.

use std::process::ExitCode;

use clap::Parser;
use sz_search_perftest::HarnessError;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the command-line level
    let level = if cli.debug_logging() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "sz-search failed");
            let code = e
                .downcast_ref::<HarnessError>()
                .map(HarnessError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
