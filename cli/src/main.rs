use clap::Parser;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_relay=info".parse()?)
                .add_directive("chat_relay_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { port, target } => {
            cli::commands::start::run(cli.config, port, target).await?;
        }
        Commands::Chat { proxy } => {
            cli::commands::chat::run(cli.config, proxy).await?;
        }
        Commands::Backend { port } => {
            cli::commands::backend::run(cli.config, port).await?;
        }
        Commands::Target { url, proxy } => {
            cli::commands::target::run(cli.config, url, proxy).await?;
        }
        Commands::Status => {
            cli::commands::status::run(cli.config).await?;
        }
    }

    Ok(())
}
