//! Productive ML CLI - drive the online learning engine
//!
//! ## Commands
//!
//! - `pml run` - Start the three learning cycles on their timers
//! - `pml simulate` - Run a fixed number of cycles back to back and report
//! - `pml export` - Simulate, then write a JSON snapshot to disk

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{export, run, simulate};

/// Productive ML - online neural analytics for mining telemetry
#[derive(Parser)]
#[command(name = "pml")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "PML_CONFIG")]
    config: Option<String>,

    /// Override the RNG seed from the configuration
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the learning scheduler until interrupted
    Run {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        duration: Option<u64>,

        /// Scale every cycle interval by this factor (0.01 runs 100x faster)
        #[arg(long, default_value = "1.0")]
        time_scale: f64,
    },

    /// Run ingestion and training cycles back to back
    #[command(alias = "sim")]
    Simulate {
        /// Number of ingestion cycles
        #[arg(short = 'n', long, default_value = "50")]
        cycles: usize,

        /// Print the final status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate, then export a snapshot of buffers, metrics and history
    Export {
        /// Output file
        #[arg(short, long, default_value = "pml-snapshot.json")]
        output: String,

        /// Number of ingestion cycles to run first
        #[arg(short = 'n', long, default_value = "50")]
        cycles: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = commands::load_config(cli.config.as_deref(), cli.seed)?;

    let result = match cli.command {
        Commands::Run {
            duration,
            time_scale,
        } => run::run(config, duration, time_scale).await,
        Commands::Simulate { cycles, json } => simulate::run(config, cycles, json).await,
        Commands::Export { output, cycles } => export::run(config, &output, cycles).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
