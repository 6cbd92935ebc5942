//! wattplan CLI
//!
//! Command-line interface for planning allocations locally or through the
//! wattplan daemon.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use wattplan_core::{UtilizationPolicy, DEFAULT_UTIL_MAX, DEFAULT_UTIL_MIN};

/// wattplan - energy-aware utilization planner
#[derive(Parser, Debug)]
#[command(name = "wattplan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:9190", global = true)]
    api: String,

    /// Lower per-server utilization bound (percent)
    #[arg(long, default_value_t = DEFAULT_UTIL_MIN, global = true)]
    util_min: f64,

    /// Upper per-server utilization bound (percent)
    #[arg(long, default_value_t = DEFAULT_UTIL_MAX, global = true)]
    util_max: f64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan the minimum-power allocation for a rate
    Plan {
        /// Cluster description (TOML)
        cluster: PathBuf,

        /// Required service rate (defaults to the file's `rate`)
        #[arg(long)]
        rate: Option<f64>,

        /// Print the allocation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the full-speed baseline allocation
    Baseline {
        /// Cluster description (TOML)
        cluster: PathBuf,

        /// Print the allocation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plan several rates and compare power
    Sweep {
        /// Cluster description (TOML)
        cluster: PathBuf,

        /// Comma-separated service rates
        #[arg(long, value_delimiter = ',', required = true)]
        rates: Vec<f64>,
    },

    /// Check a cluster description
    Validate {
        /// Cluster description (TOML)
        cluster: PathBuf,
    },

    /// Send a planning request to the daemon
    Submit {
        /// Cluster description (TOML)
        cluster: PathBuf,

        /// Required service rate (defaults to the file's `rate`)
        #[arg(long)]
        rate: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let policy = UtilizationPolicy::new(cli.util_min, cli.util_max)?;

    match cli.command {
        Commands::Plan {
            cluster,
            rate,
            json,
        } => {
            commands::plan(&cluster, rate, policy, json)?;
        }
        Commands::Baseline { cluster, json } => {
            commands::baseline(&cluster, policy, json)?;
        }
        Commands::Sweep { cluster, rates } => {
            commands::sweep(&cluster, &rates, policy)?;
        }
        Commands::Validate { cluster } => {
            commands::validate(&cluster, policy)?;
        }
        Commands::Submit { cluster, rate } => {
            let client = commands::ApiClient::new(&cli.api);
            commands::submit(&client, &cluster, rate).await?;
        }
    }

    Ok(())
}
