//! computegraph command line

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use computegraph_core::EngineConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    debug!("engine config: {:?}", config);

    match cli.command {
        Command::Ops { input_type, all } => commands::ops(&config, input_type.as_deref(), all),
        Command::Check { from, to } => {
            if !commands::check(&from, &to)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Refine {
            graph,
            responses,
            emit,
        } => commands::refine(&config, &graph, responses.as_deref(), emit).await,
        Command::Simplify { graph, responses } => {
            commands::simplify(&config, &graph, responses.as_deref()).await
        }
    }
}
