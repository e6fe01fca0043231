pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(author, version, about = "Dev proxy with a runtime-switchable upstream, plus a chat client for it")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/chat-relay/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Initial upstream (overrides CHAT_RELAY_TARGET and config)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Chat in the terminal through a running proxy
    Chat {
        /// Proxy origin (overrides config)
        #[arg(long)]
        proxy: Option<String>,
    },

    /// Run the reference backend
    Backend {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Point a running proxy at a new upstream
    Target {
        /// New upstream base URL; http:// is assumed when no scheme is given
        url: String,

        /// Proxy origin (overrides config)
        #[arg(long)]
        proxy: Option<String>,
    },

    /// Show proxy status
    Status,
}
