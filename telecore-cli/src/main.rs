//! telecore CLI: dispatch an update through the sample setup, print session namespaces, list
//! routes. Config from env and `.env`.

use anyhow::Result;
use clap::Parser;
use telecore_cli::{run, AppConfig, Cli};
use telecore_core::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_file)?;
    info!(log_file = %config.log_file, "step: telecore started");

    run(cli, &config).await
}
