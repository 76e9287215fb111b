mod commands;
mod config;
mod domain;
mod error;
mod interview;
mod logging;
mod presenter;
mod services;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use commands::Cli;
use services::EngineClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env, cli.verbose);

    tracing::info!(
        env = ?settings.env,
        api_url = %settings.api_url,
        "Starting diagnosis client"
    );

    // Create inference engine client
    let client = Arc::new(EngineClient::new(
        settings.api_url.as_str(),
        settings.api_timeout,
        settings.api_connect_timeout,
    )?);

    // Check engine health in the background; the first request reports
    // connectivity problems to the operator anyway.
    tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            match client.health_check().await {
                Ok(()) => tracing::debug!("Inference engine is healthy"),
                Err(e) => tracing::warn!(error = %e, "Inference engine health check failed"),
            }
        }
    });

    commands::run(cli, client).await
}
