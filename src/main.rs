//! src/main.rs
//!
//! Binary entry point. Parses the three positional arguments, validates
//! them, initializes tracing, and runs the node.

use anyhow::Context;
use clap::Parser;
use gossip_node::{App, Cli, NodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.index < cli.n, "index {} must be less than cluster size {}", cli.index, cli.n);

    let config = NodeConfig::from_cli(cli);

    if let Err(e) = App::new(config).run().await.context("node run failed") {
        tracing::error!(error = ?e, "node exited with an error");
        std::process::exit(1);
    }

    Ok(())
}
