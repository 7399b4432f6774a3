//! onyx-node: one dBFT bookkeeper with an in-memory chain.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod node;

use config::{LoggingConfig, NodeConfig};
use node::Node;

#[derive(Debug, Parser)]
#[command(name = "onyx-node", version, about = "dBFT bookkeeper node")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ONYX_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `logging.level` from the configuration
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(config: &LoggingConfig, level: Option<&str>) -> Result<()> {
    let directive = level.unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .with_context(|| format!("invalid log level {directive:?}"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|err| anyhow!("failed to install the log subscriber: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    init_logging(&config.logging, cli.log_level.as_deref())?;

    let node = Node::new(&config)?;
    node.run(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C");
        }
    })
    .await
}
