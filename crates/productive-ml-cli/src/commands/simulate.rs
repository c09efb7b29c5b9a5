//! Simulate command implementation

use anyhow::Result;
use colored::Colorize;
use productive_ml::{EngineConfig, MiningAnalytics};
use std::time::Instant;

use super::{print_status, simulate_cycles};

/// Run the simulate command
pub async fn run(config: EngineConfig, cycles: usize, json: bool) -> Result<()> {
    let engine = MiningAnalytics::new(config)?;

    let start = Instant::now();
    simulate_cycles(&engine, cycles).await?;
    let elapsed = start.elapsed();

    let status = engine.get_status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {} cycles in {:.2?}",
        "Simulated".green().bold(),
        cycles,
        elapsed
    );
    print_status(&status);
    Ok(())
}
