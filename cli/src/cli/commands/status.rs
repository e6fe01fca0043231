use std::path::PathBuf;

use chat_relay_core::config::{config_source, expand_path, load_config};

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let source = config_source(config_path.clone());
    let config = load_config(config_path)?;

    println!("chat-relay Status");
    println!("=================");
    println!();
    println!("Configuration:");
    match &source {
        Some(path) => println!("  Config file: {:?}", path),
        None => println!("  Config file: none (defaults)"),
    }
    println!("  Client state: {:?}", expand_path(&config.client.state_file));
    println!();
    println!("Proxy settings:");
    println!("  Host: {}", config.server.bind_host());
    println!("  Port: {}", config.server.port);
    println!("  Prefix: {}", config.proxy.prefix);
    println!("  Control path: {}", config.proxy.control_path);
    println!("  Default target: {}", config.initial_target());
    println!();

    // Check if server is reachable
    let url = format!("{}/healthz", config.client.proxy_url.trim_end_matches('/'));
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            println!("Server: RUNNING ✓");
            if let Some(target) = body.get("target").and_then(|v| v.as_str()) {
                println!("  Current target: {}", target);
            }
        }
        _ => {
            println!("Server: NOT RUNNING ({})", config.client.proxy_url);
        }
    }

    Ok(())
}
