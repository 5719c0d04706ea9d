//! CLI argument parsing and command dispatch

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sz_search_perftest::{FinalReport, PerfTestArgs, RunnerBuilder};
use sz_search_server::ServerConfig;

#[derive(Parser)]
#[command(name = "sz-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the search API over HTTP
    Serve(ServerConfig),
    /// Replay a query file against a running server
    Perftest(PerfTestArgs),
}

impl Cli {
    /// Whether debug-level logging was requested
    pub fn debug_logging(&self) -> bool {
        match &self.command {
            Commands::Serve(config) => self.verbose || config.debug,
            Commands::Perftest(_) => self.verbose,
        }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve(config) => {
                sz_search_server::serve(config).await?;
                Ok(())
            }
            Commands::Perftest(args) => run_perftest(args).await,
        }
    }
}

async fn run_perftest(args: PerfTestArgs) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Replaying {}", args.input.display()));

    let hook_pb = pb.clone();
    let runner = RunnerBuilder::new()
        .config(args.harness_config())
        .on_progress(move |snapshot| hook_pb.println(snapshot.to_string()))
        .build()?;

    let result = runner.run_file(&args.input).await;
    pb.finish_and_clear();
    let report = result?;

    println!("{report}");
    if let Some(path) = &args.json {
        write_json(&report, path)?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
    }

    Ok(())
}

fn write_json(report: &FinalReport, path: &std::path::Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))
}
