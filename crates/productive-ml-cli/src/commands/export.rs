//! Export command implementation

use anyhow::{Context, Result};
use colored::Colorize;
use productive_ml::{EngineConfig, MiningAnalytics};

use super::simulate_cycles;

/// Run the export command
pub async fn run(config: EngineConfig, output: &str, cycles: usize) -> Result<()> {
    let engine = MiningAnalytics::new(config)?;
    simulate_cycles(&engine, cycles).await?;

    engine
        .export_to_file(output)
        .with_context(|| format!("failed to write snapshot to {}", output))?;

    println!(
        "{} snapshot after {} cycles to {}",
        "Exported".green().bold(),
        cycles,
        output.cyan()
    );
    Ok(())
}
