// CLI for watching a card reader feed from a terminal

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tapfeed_client::{shutdown_pair, ClientConfig, FeedClient};
use tapfeed_core::GroupConfig;

#[derive(Parser)]
#[command(name = "tapfeed")]
#[command(about = "Watch an NFC card reader push feed", long_about = None)]
struct Cli {
    /// WebSocket endpoint of the push feed
    #[arg(short, long)]
    endpoint: Option<String>,

    /// TOML settings file (endpoint, timeouts, backoff)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// JSON file with exclusive-group definitions
    #[arg(short, long)]
    groups: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.settings {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing settings file {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }

    Ok(config)
}

fn load_groups(cli: &Cli) -> anyhow::Result<Option<GroupConfig>> {
    match &cli.groups {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading group file {}", path.display()))?;
            let groups = serde_json::from_str(&raw)
                .with_context(|| format!("parsing group file {}", path.display()))?;
            Ok(Some(groups))
        }
        None => Ok(None),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .init();

    let config = load_config(&cli)?;
    let groups = load_groups(&cli)?;

    let mut client = FeedClient::new(config, groups, |event| match serde_json::to_string(&event) {
        Ok(line) => println!("{line}"),
        Err(error) => tracing::warn!(%error, "failed to encode event"),
    })?;

    let (handle, shutdown) = shutdown_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, shutting down");
            handle.shutdown();
        }
    });

    client.run(shutdown).await;
    Ok(())
}
