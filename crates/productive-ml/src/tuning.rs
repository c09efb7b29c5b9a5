//! Mining-parameter feedback
//!
//! [`TuningParameters::from_summary`] turns a [`PatternSummary`] into the
//! parameter map sent to a [`ParameterSink`].

use crate::config::TuningConfig;
use crate::error::{MlError, Result};
use crate::patterns::PatternSummary;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Parameters pushed to the mining subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningParameters {
    /// Set only when the difficulty/complexity ratio leaves its band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_multiplier: Option<f64>,
    /// Set together with `difficulty_multiplier`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_adjustment: Option<f64>,
    /// Reward bonus from value/time efficiency, clamped
    pub reward_efficiency_bonus: f64,
    /// Raise or lower factor from the optimisation correlation
    pub mining_difficulty_adjustment: f64,
}

impl TuningParameters {
    /// Derive parameters from recent pattern statistics
    pub fn from_summary(summary: &PatternSummary, config: &TuningConfig) -> Self {
        let ratio = summary.avg_difficulty_complexity_ratio;
        let (difficulty_multiplier, complexity_adjustment) = if ratio < config.low_ratio {
            (
                Some(config.low_ratio_factors.0),
                Some(config.low_ratio_factors.1),
            )
        } else if ratio > config.high_ratio {
            (
                Some(config.high_ratio_factors.0),
                Some(config.high_ratio_factors.1),
            )
        } else {
            (None, None)
        };

        let reward_efficiency_bonus = (summary.avg_value_time_efficiency
            / config.efficiency_scale)
            .clamp(config.bonus_min, config.bonus_max);

        let mining_difficulty_adjustment =
            if summary.avg_optimization_correlation > config.correlation_threshold {
                config.mining_raise
            } else {
                config.mining_lower
            };

        Self {
            difficulty_multiplier,
            complexity_adjustment,
            reward_efficiency_bonus,
            mining_difficulty_adjustment,
        }
    }

    /// Named parameters that are set, in a fixed order
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = Vec::with_capacity(4);
        if let Some(v) = self.difficulty_multiplier {
            entries.push(("difficulty_multiplier", v));
        }
        if let Some(v) = self.complexity_adjustment {
            entries.push(("complexity_adjustment", v));
        }
        entries.push(("reward_efficiency_bonus", self.reward_efficiency_bonus));
        entries.push((
            "mining_difficulty_adjustment",
            self.mining_difficulty_adjustment,
        ));
        entries
    }

    /// Reject parameter sets with a non-finite or non-positive factor
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value <= 0.0 {
                return Err(MlError::ParameterSink(format!(
                    "{} must be a positive finite factor, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Receiver of tuning decisions
#[async_trait]
pub trait ParameterSink: Send + Sync {
    /// Apply a parameter set to the mining subsystem
    async fn apply_optimizations(&self, params: &TuningParameters) -> Result<()>;
}

/// Sink that validates and logs each parameter
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingParameterSink;

#[async_trait]
impl ParameterSink for LoggingParameterSink {
    async fn apply_optimizations(&self, params: &TuningParameters) -> Result<()> {
        params.validate()?;
        for (name, value) in params.entries() {
            info!(parameter = name, value, "Optimization applied");
        }
        Ok(())
    }
}
