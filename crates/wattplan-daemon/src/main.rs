//! wattplan daemon
//!
//! Serves the allocation planner over HTTP.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wattplan_api::create_router;
use wattplan_core::DaemonConfig;

/// wattplan daemon - energy-aware utilization planner service
#[derive(Parser, Debug)]
#[command(name = "wattpland")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the API server
    #[arg(long)]
    address: Option<String>,

    /// Port for the REST API server
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(address) = args.address {
        config.api.address = address;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&config.logging.level))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set subscriber")?;

    info!("Starting wattplan daemon v{}", env!("CARGO_PKG_VERSION"));

    let policy = config.policy.to_policy()?;
    info!(
        util_min = policy.util_min,
        util_max = policy.util_max,
        "Utilization policy loaded"
    );

    let router = create_router(policy);

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.port)
        .parse()
        .context("Invalid address")?;

    info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
