//! Stowage command-line client.

mod cli;
mod commands;
mod config;
mod logging;

use clap::Parser;
use eyre::WrapErr;
use stowage_client::Client;

use crate::{cli::Cli, config::StowageConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let config = StowageConfig::load(cli.config.as_deref(), &cli.overrides())?;
    tracing::debug!(chain = %config.chain.rest(), chain_id = %config.chain.id(), "configuration loaded");

    let client = Client::new(config.client_config()?).wrap_err("Failed to build client")?;
    commands::run(client, cli.command).await
}
