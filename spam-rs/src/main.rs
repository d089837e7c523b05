use anyhow::Context;
use spam_rs::api::ApiServer;
use spam_rs::config::Config;
use spam_rs::logging::init_tracing;
use spam_rs::SpamService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional config path as first argument, config.toml otherwise
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    info!("Starting spam-rs server");
    info!("Configuration loaded");
    info!("  API listening on: {}", config.server.listen_addr);
    info!("  Model: {}", config.model.path.display());
    info!("  History log: {}", config.history.log_path.display());
    info!("  Structured history: {}", config.history.structured_path.display());

    let service = SpamService::from_config(&config).with_context(|| {
        format!(
            "Failed to load model from {} (run `spam-cli train` first)",
            config.model.path.display()
        )
    })?;
    info!(
        "Model loaded ({} terms)",
        service.pipeline().vocabulary().len()
    );

    let server = ApiServer::new(Arc::new(service), config.server.listen_addr.clone());
    server.run().await?;

    Ok(())
}
