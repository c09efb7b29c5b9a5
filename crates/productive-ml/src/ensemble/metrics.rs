//! Per-model performance tracking

use crate::role::ModelRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weights of the adaptation-score terms. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptationWeights {
    /// Weight of the tracked accuracy
    pub accuracy: f32,
    /// Weight of the absolute convergence rate
    pub convergence: f32,
    /// Weight of the normalised cycle count
    pub cycles: f32,
    /// Weight of the stability term `1 - |convergence|`
    pub stability: f32,
}

impl AdaptationWeights {
    /// Build a weight set
    pub const fn new(accuracy: f32, convergence: f32, cycles: f32, stability: f32) -> Self {
        Self {
            accuracy,
            convergence,
            cycles,
            stability,
        }
    }

    /// Default weighting for a role
    pub fn for_role(role: ModelRole) -> Self {
        match role {
            ModelRole::SolutionQuality => Self::new(0.4, 0.3, 0.2, 0.1),
            ModelRole::DifficultyEstimation => Self::new(0.5, 0.2, 0.2, 0.1),
            ModelRole::ComplexityPrediction => Self::new(0.4, 0.3, 0.1, 0.2),
            ModelRole::PatternRecognition => Self::new(0.3, 0.4, 0.2, 0.1),
            ModelRole::OptimizationStrategy => Self::new(0.3, 0.3, 0.2, 0.2),
            ModelRole::ValueEstimation => Self::new(0.5, 0.2, 0.2, 0.1),
            ModelRole::SecurityAnalysis => Self::new(0.4, 0.2, 0.1, 0.3),
            ModelRole::EfficiencyOptimization => Self::new(0.3, 0.4, 0.2, 0.1),
        }
    }

    /// Sum of all four weights
    pub fn total(&self) -> f32 {
        self.accuracy + self.convergence + self.cycles + self.stability
    }

    /// Check weights are non-negative and sum to 1
    pub fn validate(&self) -> std::result::Result<(), String> {
        let all = [self.accuracy, self.convergence, self.cycles, self.stability];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        let total = self.total();
        if (total - 1.0).abs() > 1e-3 {
            return Err(format!("weights must sum to 1, got {:.3}", total));
        }
        Ok(())
    }

    /// Weighted composite of accuracy, convergence, maturity and stability.
    ///
    /// Maturity is `min(cycles / horizon, 1)`.
    pub fn score(&self, metrics: &PerformanceMetrics, horizon: u64) -> f32 {
        let convergence = metrics.convergence_rate.abs();
        let maturity = if horizon == 0 {
            1.0
        } else {
            (metrics.training_cycles as f32 / horizon as f32).min(1.0)
        };
        let stability = 1.0 - convergence;

        self.accuracy * metrics.accuracy
            + self.convergence * convergence
            + self.cycles * maturity
            + self.stability * stability
    }
}

/// Tracked health of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Exponentially tracked accuracy
    pub accuracy: f32,
    /// Exponentially tracked loss
    pub loss: f32,
    /// Completed training cycles
    pub training_cycles: u64,
    /// Highest tracked accuracy seen
    pub best_accuracy: f32,
    /// Accuracy gain recorded when the best accuracy was last raised
    pub convergence_rate: f32,
    /// Weighted health composite
    pub adaptation_score: f32,
    /// Time of the last metric update
    pub last_update: DateTime<Utc>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            accuracy: 0.5,
            loss: 1.0,
            training_cycles: 0,
            best_accuracy: 0.0,
            convergence_rate: 0.0,
            adaptation_score: 0.0,
            last_update: Utc::now(),
        }
    }
}

impl PerformanceMetrics {
    /// Fold one training cycle's mean loss and accuracy into the tracked values.
    ///
    /// Returns the change in tracked accuracy.
    pub fn record_cycle(
        &mut self,
        batch_loss: f32,
        batch_accuracy: f32,
        smoothing: f32,
        weights: &AdaptationWeights,
        horizon: u64,
    ) -> f32 {
        let previous = self.accuracy;
        self.accuracy = smoothing * batch_accuracy + (1.0 - smoothing) * previous;
        self.loss = smoothing * batch_loss + (1.0 - smoothing) * self.loss;
        self.training_cycles += 1;
        self.last_update = Utc::now();

        let improvement = self.accuracy - previous;
        if self.accuracy > self.best_accuracy {
            self.best_accuracy = self.accuracy;
            self.convergence_rate = improvement;
        }

        self.adaptation_score = weights.score(self, horizon);
        improvement
    }
}
