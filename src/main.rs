//! mapDB - A Minimal In-Memory Key-Value Store
//!
//! This is the main entry point for the mapDB server.
//! It parses flags, sets up logging, binds the listener and serves clients
//! until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use mapdb::server::{Server, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line flags
#[derive(Parser, Debug)]
#[command(name = "mapdb", version, about, long_about = None)]
struct Cli {
    /// Host on which the server listens
    #[arg(long, default_value = mapdb::DEFAULT_HOST)]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig {
        host: cli.host,
        ..ServerConfig::default()
    };

    info!(version = mapdb::VERSION, "Starting server on {}...", config.bind_address());

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(address = %config.bind_address(), error = %e, "Failed to bind listener");
            return Err(e).with_context(|| format!("failed to bind {}", config.bind_address()));
        }
    };

    info!(
        privilege = %config.default_privilege,
        "Listening on {}",
        server.local_addr()?
    );

    server.run_until_ctrl_c().await;

    info!("Server shutdown complete");
    Ok(())
}
