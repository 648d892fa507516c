//! Socket Gateway (v1)
//!
//! Hosts one adapter instance and feeds it invocations as JSON lines.
//!
//! # Architecture Overview
//!
//! ```text
//!   invocation (stdin)                                  ┌──────────────┐
//!   ──────────────▶ runtime::stdio ──▶ lifecycle ──────▶│ local server │
//!                                      manager   start  │ (child proc) │
//!                                        │              └──────┬───────┘
//!                                        ▼                     │
//!   result (stdout)                  http::forward ◀───────────┘
//!   ◀────────────── headers ◀──────────┘        unix socket
//!                   normalize
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;

use socket_gateway::config::{load_config, validate_config, GatewayConfig};
use socket_gateway::lifecycle::{CommandLauncher, ConnectionLifecycleManager};
use socket_gateway::net::SocketAddressAllocator;
use socket_gateway::observability::init_logging;

#[derive(Parser)]
#[command(name = "socket-gateway")]
#[command(
    about = "Forward JSON-line invocations to a local HTTP server over a Unix socket",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {}", error);
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    init_logging(&config.observability);

    tracing::info!("socket-gateway v0.1.0 starting");
    tracing::info!(
        socket_directory = %config.socket.directory,
        command = %config.server.command,
        max_bind_conflicts = config.retries.max_bind_conflicts,
        max_respawns = config.retries.max_respawns,
        "Configuration loaded"
    );

    let mut manager = ConnectionLifecycleManager::new(
        CommandLauncher::new(config.server.clone()),
        SocketAddressAllocator::from_config(&config.socket),
        config.retries.clone(),
    );

    socket_gateway::runtime::run(
        &mut manager,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!("Input closed, shutting down");
    Ok(())
}
