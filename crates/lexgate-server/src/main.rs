//! lexgate server binary
//!
//! Starts the HTTP gateway. Configuration comes from an optional TOML file,
//! then environment variables, then command-line flags.

use anyhow::Context;
use clap::Parser;
use lexgate_server::{config::ServerConfig, start_server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP gateway for LLM-based information extraction
#[derive(Debug, Parser)]
#[command(name = "lexgate-server", version, about)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(short, long, env = "LEXGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides config and LEXGATE_BIND_ADDRESS)
    #[arg(long)]
    bind_address: Option<String>,

    /// Port to bind (overrides config and LEXGATE_BIND_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config
        .with_env_overrides()
        .context("applying environment overrides")?;

    if let Some(address) = cli.bind_address {
        config.bind_address = address;
    }
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    start_server(config).await?;
    Ok(())
}
