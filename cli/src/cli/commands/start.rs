use std::path::PathBuf;

use chat_relay_core::config::{expand_path, load_config};
use chat_relay_core::proxy::ProxyServer;
use chat_relay_core::{normalize_target, TargetStore};

pub async fn run(
    config_path: Option<PathBuf>,
    port_override: Option<u16>,
    target_override: Option<String>,
) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(dir) = config.ui.directory.take() {
        config.ui.directory = Some(expand_path(&dir));
    }

    let initial_target = match target_override {
        Some(target) => normalize_target(&target),
        None => config.initial_target(),
    };

    tracing::info!("Starting chat-relay proxy...");
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Host: {}", config.server.bind_host());
    tracing::info!("  Forwarding: {}/* -> {}", config.proxy.prefix, initial_target);
    tracing::info!("  Control endpoint: POST {}", config.proxy.control_path);
    if let Some(dir) = &config.ui.directory {
        tracing::info!("  UI directory: {:?}", dir);
    }

    let server = ProxyServer::new(
        config.server.bind_host().to_string(),
        config.server.port,
        TargetStore::new(initial_target),
        &config.proxy,
        &config.ui,
    )?;

    tracing::info!(
        "Proxy server starting on http://{}:{}",
        config.server.bind_host(),
        config.server.port
    );
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
