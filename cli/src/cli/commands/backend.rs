use std::path::PathBuf;
use std::sync::Arc;

use chat_relay_core::backend::{BackendServer, EchoGenerator};
use chat_relay_core::config::load_config;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.backend.port = port;
    }

    if config.backend.models.is_empty() {
        tracing::warn!("No models configured; /models will return an empty list.");
    }

    let hf_token = config.hf_token();
    let server = BackendServer::new(
        config.backend.host.clone(),
        config.backend.port,
        config.backend.models.clone(),
        hf_token,
        Arc::new(EchoGenerator),
    );

    tracing::info!("Press Ctrl+C to stop");
    server.run().await?;

    Ok(())
}
