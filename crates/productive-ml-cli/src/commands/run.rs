//! Run command implementation
//!
//! Starts the timer-driven scheduler and prints a status report on exit.

use anyhow::{bail, Result};
use colored::Colorize;
use productive_ml::{EngineConfig, LearningScheduler, MiningAnalytics};
use std::sync::Arc;
use std::time::Duration;

use super::print_status;

/// Run the run command
pub async fn run(mut config: EngineConfig, duration: Option<u64>, time_scale: f64) -> Result<()> {
    if !(time_scale > 0.0) {
        bail!("time scale must be positive, got {}", time_scale);
    }
    let s = &mut config.scheduler;
    for interval in [
        &mut s.ingestion_interval_ms,
        &mut s.pattern_interval_ms,
        &mut s.optimization_interval_ms,
    ] {
        *interval = ((*interval as f64 * time_scale).round() as u64).max(1);
    }

    let engine = Arc::new(MiningAnalytics::new(config)?);
    let scheduler = Arc::new(LearningScheduler::new(Arc::clone(&engine)));

    println!(
        "{} ingestion every {} ms, pattern training every {} ms, optimization every {} ms",
        "Starting scheduler:".green().bold(),
        scheduler.config().ingestion_interval_ms,
        scheduler.config().pattern_interval_ms,
        scheduler.config().optimization_interval_ms
    );
    scheduler.start();

    match duration {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            println!("{}", "Press Ctrl-C to stop.".dimmed());
            tokio::signal::ctrl_c().await?;
        }
    }

    scheduler.stop().await;

    let stats = scheduler.stats();
    println!();
    println!(
        "{} ingestion {} ({} skipped), pattern {} ({} skipped), optimization {} ({} skipped)",
        "Cycles run:".bold(),
        stats.ingestion.runs,
        stats.ingestion.skips,
        stats.pattern_training.runs,
        stats.pattern_training.skips,
        stats.optimization_training.runs,
        stats.optimization_training.skips
    );
    print_status(&engine.get_status());
    Ok(())
}
