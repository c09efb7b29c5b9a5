//! CLI command implementations
//!
//! - `run` - Timer-driven scheduler
//! - `simulate` - Back-to-back cycles with a status report
//! - `export` - Snapshot export

pub mod export;
pub mod run;
pub mod simulate;

use anyhow::{Context, Result};
use colored::Colorize;
use productive_ml::{EngineConfig, EnsembleStatus, MiningAnalytics, Priority};

/// Load the configuration file, or defaults when none is given
pub fn load_config(path: Option<&str>, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("failed to load configuration from {}", p))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = seed {
        config.ensemble.seed = seed;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Run `cycles` ingestion cycles, with the training cycles interleaved at
/// the same relative cadence as the timers.
pub async fn simulate_cycles(engine: &MiningAnalytics, cycles: usize) -> Result<()> {
    let s = &engine.config().scheduler;
    let pattern_every = (s.pattern_interval_ms / s.ingestion_interval_ms.max(1)).max(1) as usize;
    let optimization_every =
        (s.optimization_interval_ms / s.ingestion_interval_ms.max(1)).max(1) as usize;

    for i in 1..=cycles {
        engine.run_ingestion_cycle().await?;
        if i % pattern_every == 0 {
            engine.run_pattern_cycle().await;
        }
        if i % optimization_every == 0 {
            engine.run_optimization_cycle().await;
        }
    }
    Ok(())
}

/// Human-readable status report
pub fn print_status(status: &EnsembleStatus) {
    println!();
    println!("{}", "Model Performance:".bold().cyan());
    println!(
        "  {:<24} {:>9} {:>8} {:>7} {:>9} {:>7} {:>7}",
        "model".dimmed(),
        "accuracy".dimmed(),
        "loss".dimmed(),
        "cycles".dimmed(),
        "best".dimmed(),
        "adapt".dimmed(),
        "buffer".dimmed()
    );
    for m in &status.models {
        let accuracy = format!("{:.1}%", m.accuracy * 100.0);
        let accuracy = if m.accuracy > 0.7 {
            accuracy.green()
        } else if m.accuracy > 0.3 {
            accuracy.yellow()
        } else {
            accuracy.red()
        };
        println!(
            "  {:<24} {:>9} {:>8.4} {:>7} {:>8.1}% {:>7.3} {:>7}",
            m.role.name(),
            accuracy,
            m.loss,
            m.training_cycles,
            m.best_accuracy * 100.0,
            m.adaptation_score,
            m.buffer_size
        );
    }

    let o = &status.overall;
    println!();
    println!("{}", "Overall:".bold().cyan());
    println!("  {} {:.1}%", "Average accuracy:".dimmed(), o.avg_accuracy * 100.0);
    println!("  {} {}", "Training cycles:".dimmed(), o.total_training_cycles);
    println!("  {} {}", "Solutions processed:".dimmed(), o.solutions_processed);
    println!("  {} {}", "Patterns recognized:".dimmed(), o.patterns_recognized);
    println!("  {} {:.3}", "Total adaptation:".dimmed(), o.total_adaptation);

    if let Some(p) = &status.patterns {
        println!();
        println!("{}", "Patterns:".bold().cyan());
        println!(
            "  {} {:.2}",
            "Difficulty/complexity ratio:".dimmed(),
            p.avg_difficulty_complexity_ratio
        );
        println!("  {} {:.2}", "Value/time efficiency:".dimmed(), p.avg_value_time_efficiency);
        println!(
            "  {} {:.3}",
            "Optimization correlation:".dimmed(),
            p.avg_optimization_correlation
        );
    }

    if let Some(d) = &status.discovery {
        println!();
        println!("{}", "Discovery:".bold().cyan());
        println!("  {} {:.2}%", "Rate:".dimmed(), d.discovery_rate * 100.0);
        println!("  {} {}", "Total:".dimmed(), d.total_discoveries);
        println!("  {} {:.1}", "Mean value:".dimmed(), d.avg_discovery_value);
    }

    println!();
    if status.recommendations.is_empty() {
        println!("{}", "No recommendations.".dimmed());
    } else {
        println!("{}", "Recommendations:".bold().cyan());
        for r in &status.recommendations {
            let tag = match r.priority {
                Priority::High => "HIGH".red().bold(),
                Priority::Medium => "MED ".yellow().bold(),
                Priority::Low => "LOW ".normal(),
            };
            println!("  [{}] {} {}", tag, r.description, format!("({})", r.action).dimmed());
        }
    }
    println!();
}
