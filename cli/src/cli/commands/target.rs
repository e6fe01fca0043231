use std::path::PathBuf;

use chat_relay_core::config::load_config;

pub async fn run(
    config_path: Option<PathBuf>,
    url: String,
    proxy_override: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let proxy = proxy_override.unwrap_or(config.client.proxy_url);
    let endpoint = format!("{}{}", proxy.trim_end_matches('/'), config.proxy.control_path);

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&serde_json::json!({ "target": url }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();

    if !status.is_success() {
        let reason = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        anyhow::bail!("Proxy rejected target ({}): {}", status, reason);
    }

    println!("Proxy at {} now forwards to {}", proxy, url);
    Ok(())
}
