use std::io::Write;
use std::path::PathBuf;

use chat_relay_core::client::{ChatClient, ClientState, FileTargetStorage};
use chat_relay_core::config::{expand_path, load_config};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<PathBuf>, proxy_override: Option<String>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(proxy) = proxy_override {
        config.client.proxy_url = proxy;
    }

    let storage = FileTargetStorage::new(expand_path(&config.client.state_file));
    let mut client = ChatClient::from_config(&config, storage)?;

    // Transient steps are only visible through the watch channel
    let mut updates = client.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match state {
                ClientState::Configuring => eprintln!("Connecting..."),
                ClientState::Probing => eprintln!("Checking available models..."),
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("chat-relay chat via {}", config.client.proxy_url);
    println!("Type 'exit' or 'quit' to end the session");

    client.resume().await;

    loop {
        match client.state() {
            ClientState::Unconfigured { error } => {
                if let Some(error) = error {
                    println!("❌ {}", error);
                }
                let Some(input) = prompt(&mut lines, "Endpoint URL> ").await? else {
                    break;
                };
                if is_exit(&input) {
                    break;
                }
                if input.is_empty() {
                    continue;
                }
                if let ClientState::Ready { models, selected } = client.configure(&input).await {
                    print_models(&models, &selected);
                }
            }
            ClientState::Error { message } => {
                println!("❌ {}", message);
                let Some(input) =
                    prompt(&mut lines, "Press Enter to retry, or type 'config' for a new endpoint> ").await?
                else {
                    break;
                };
                if is_exit(&input) {
                    break;
                }
                if input == "config" {
                    client.reconfigure();
                } else if let ClientState::Ready { models, selected } = client.retry().await {
                    print_models(&models, &selected);
                }
            }
            ClientState::Ready { models, selected } => {
                let Some(input) = prompt(&mut lines, &format!("[{}] > ", selected)).await? else {
                    break;
                };
                if is_exit(&input) {
                    break;
                }
                if input.is_empty() {
                    continue;
                }

                if input == "/models" {
                    print_models(&models, &selected);
                } else if let Some(model) = input.strip_prefix("/model ") {
                    if let Err(e) = client.select_model(model.trim()) {
                        println!("❌ {}", e);
                    }
                } else if input == "/config" {
                    client.reconfigure();
                } else {
                    let reply = client.send(&input).await?;
                    println!("🤖 {}", reply.content);
                }
            }
            ClientState::Configuring | ClientState::Probing => {
                tokio::task::yield_now().await;
            }
        }
    }

    println!("Exiting chat session.");
    Ok(())
}

async fn prompt<R>(lines: &mut tokio::io::Lines<R>, label: &str) -> anyhow::Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

fn is_exit(input: &str) -> bool {
    input == "exit" || input == "quit"
}

fn print_models(models: &[String], selected: &str) {
    println!("Available models (switch with /model <id>, reconfigure with /config):");
    for model in models {
        let marker = if model == selected { "*" } else { " " };
        println!("  {} {}", marker, model);
    }
}
