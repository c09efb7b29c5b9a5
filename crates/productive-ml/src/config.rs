//! Engine configuration.
//!
//! Every group's `Default` holds the constants the engine ships with. All of
//! them match the original dashboard except three network defaults: learning
//! rate (0.01 vs 0.001), LR decay (0.999 vs 0.995) and LR floor (0.001 vs
//! 0.0001). A training cycle makes up to `2 * batch_size` gradient steps, so
//! a 0.995 decay reaches the 0.0001 floor within about fifty cycles and the
//! models stop learning. The original values can still be set here.
//!
//! The whole tree can be loaded from TOML with any subset of keys present:
//!
//! ```toml
//! [network]
//! learning_rate = 0.02
//!
//! [scheduler]
//! ingestion_interval_ms = 10000
//!
//! [[ensemble.adaptation_overrides]]
//! role = "securityAnalysis"
//! weights = { accuracy = 0.5, convergence = 0.2, cycles = 0.1, stability = 0.2 }
//! ```

use crate::ensemble::AdaptationWeights;
use crate::error::{MlError, Result};
use crate::role::ModelRole;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-network hyperparameters
    pub network: TrainingParams,
    /// Ensemble buffers, gating and metric tracking
    pub ensemble: EnsembleConfig,
    /// History and pattern retention
    pub history: HistoryConfig,
    /// Cycle cadence and batch sizes
    pub scheduler: SchedulerConfig,
    /// Tuning-parameter derivation
    pub tuning: TuningConfig,
}

impl EngineConfig {
    /// Load and validate a TOML configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break training or scheduling
    pub fn validate(&self) -> Result<()> {
        let n = &self.network;
        if !(n.learning_rate > 0.0) {
            return Err(MlError::Config("network.learning_rate must be positive".into()));
        }
        if !(0.0..1.0).contains(&n.momentum) {
            return Err(MlError::Config("network.momentum must be in [0, 1)".into()));
        }
        if !(0.0..1.0).contains(&n.dropout) {
            return Err(MlError::Config("network.dropout must be in [0, 1)".into()));
        }
        if n.l2_regularization < 0.0 {
            return Err(MlError::Config("network.l2_regularization must be >= 0".into()));
        }
        if !(n.lr_decay > 0.0 && n.lr_decay <= 1.0) {
            return Err(MlError::Config("network.lr_decay must be in (0, 1]".into()));
        }
        if n.min_learning_rate < 0.0 || n.min_learning_rate > n.learning_rate {
            return Err(MlError::Config(
                "network.min_learning_rate must be in [0, learning_rate]".into(),
            ));
        }
        if !(n.accuracy_tolerance > 0.0) {
            return Err(MlError::Config("network.accuracy_tolerance must be positive".into()));
        }

        let e = &self.ensemble;
        if e.buffer_capacity == 0 {
            return Err(MlError::Config("ensemble.buffer_capacity must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&e.confidence_floor) {
            return Err(MlError::Config("ensemble.confidence_floor must be in [0, 1]".into()));
        }
        if !(e.metric_smoothing > 0.0 && e.metric_smoothing <= 1.0) {
            return Err(MlError::Config("ensemble.metric_smoothing must be in (0, 1]".into()));
        }
        if e.cycle_horizon == 0 {
            return Err(MlError::Config("ensemble.cycle_horizon must be non-zero".into()));
        }
        for o in &e.adaptation_overrides {
            o.weights.validate().map_err(|msg| {
                MlError::Config(format!("adaptation weights for {}: {}", o.role, msg))
            })?;
        }

        let h = &self.history;
        if h.solution_capacity == 0 || h.trim_batch == 0 || h.trim_batch > h.solution_capacity {
            return Err(MlError::Config(
                "history.trim_batch must be in [1, solution_capacity]".into(),
            ));
        }
        if h.pattern_capacity == 0 {
            return Err(MlError::Config("history.pattern_capacity must be non-zero".into()));
        }

        let s = &self.scheduler;
        if s.ingestion_interval_ms == 0
            || s.pattern_interval_ms == 0
            || s.optimization_interval_ms == 0
        {
            return Err(MlError::Config("scheduler intervals must be non-zero".into()));
        }
        for role in ModelRole::ALL {
            if s.batch_sizes.get(role) == 0 {
                return Err(MlError::Config(format!("batch size for {} must be non-zero", role)));
            }
        }
        if s.min_improved_models > ModelRole::OPTIMIZATION_CYCLE.len() {
            return Err(MlError::Config(
                "scheduler.min_improved_models exceeds the optimisation cycle size".into(),
            ));
        }

        let t = &self.tuning;
        if t.bonus_min > t.bonus_max {
            return Err(MlError::Config("tuning.bonus_min must be <= bonus_max".into()));
        }
        if !(t.efficiency_scale > 0.0) {
            return Err(MlError::Config("tuning.efficiency_scale must be positive".into()));
        }

        Ok(())
    }
}

/// Hyperparameters shared by every dense network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Initial learning rate
    pub learning_rate: f32,
    /// Momentum coefficient applied to the previous update
    pub momentum: f32,
    /// L2 penalty on weights (not biases)
    pub l2_regularization: f32,
    /// Dropout probability on hidden layers during training
    pub dropout: f32,
    /// Decay the learning rate after every successful training call
    pub adaptive_lr: bool,
    /// Multiplicative decay factor
    pub lr_decay: f32,
    /// Learning rate floor
    pub min_learning_rate: f32,
    /// Absolute tolerance for an output component to count as correct
    pub accuracy_tolerance: f32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.9,
            l2_regularization: 0.001,
            dropout: 0.1,
            adaptive_lr: true,
            lr_decay: 0.999,
            min_learning_rate: 0.001,
            accuracy_tolerance: 0.1,
        }
    }
}

/// Per-role override of the adaptation-score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationOverride {
    /// Role the weights apply to
    pub role: ModelRole,
    /// Replacement weights
    pub weights: AdaptationWeights,
}

/// Ensemble-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Training samples kept per model
    pub buffer_capacity: usize,
    /// Minimum tracked accuracy before a model's predictions are published
    pub confidence_floor: f32,
    /// Accuracy gain a batch must exceed to count as an improvement
    pub improvement_threshold: f32,
    /// Weight of the newest batch in the exponential accuracy/loss tracking
    pub metric_smoothing: f32,
    /// Training cycles at which the maturity term of the adaptation score saturates
    pub cycle_horizon: u64,
    /// Seed for weight initialisation and dropout masks
    pub seed: u64,
    /// Replacement adaptation weights for selected roles
    pub adaptation_overrides: Vec<AdaptationOverride>,
}

impl EnsembleConfig {
    /// Effective adaptation weights for `role`
    pub fn adaptation_weights(&self, role: ModelRole) -> AdaptationWeights {
        self.adaptation_overrides
            .iter()
            .rev()
            .find(|o| o.role == role)
            .map(|o| o.weights)
            .unwrap_or_else(|| AdaptationWeights::for_role(role))
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 500,
            confidence_floor: 0.3,
            improvement_threshold: 0.02,
            metric_smoothing: 0.5,
            cycle_horizon: 100,
            seed: 42,
            adaptation_overrides: Vec::new(),
        }
    }
}

/// Retention limits for history, patterns and exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum solution records held
    pub solution_capacity: usize,
    /// Records dropped from the front once capacity is exceeded
    pub trim_batch: usize,
    /// Maximum pattern snapshots held
    pub pattern_capacity: usize,
    /// Snapshots averaged when deriving tuning parameters
    pub optimization_window: usize,
    /// Snapshots averaged for the status report
    pub status_window: usize,
    /// Most recent training samples per model included in an export
    pub export_samples: usize,
    /// Most recent solution records included in an export
    pub export_solutions: usize,
    /// Most recent pattern snapshots included in an export
    pub export_patterns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            solution_capacity: 1000,
            trim_batch: 100,
            pattern_capacity: 1000,
            optimization_window: 10,
            status_window: 5,
            export_samples: 100,
            export_solutions: 50,
            export_patterns: 20,
        }
    }
}

/// Batch size used when training each role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSizes {
    pub solution_quality: usize,
    pub difficulty_estimation: usize,
    pub complexity_prediction: usize,
    pub pattern_recognition: usize,
    pub optimization_strategy: usize,
    pub value_estimation: usize,
    pub security_analysis: usize,
    pub efficiency_optimization: usize,
}

impl BatchSizes {
    /// Batch size for `role`
    pub fn get(&self, role: ModelRole) -> usize {
        match role {
            ModelRole::SolutionQuality => self.solution_quality,
            ModelRole::DifficultyEstimation => self.difficulty_estimation,
            ModelRole::ComplexityPrediction => self.complexity_prediction,
            ModelRole::PatternRecognition => self.pattern_recognition,
            ModelRole::OptimizationStrategy => self.optimization_strategy,
            ModelRole::ValueEstimation => self.value_estimation,
            ModelRole::SecurityAnalysis => self.security_analysis,
            ModelRole::EfficiencyOptimization => self.efficiency_optimization,
        }
    }
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            solution_quality: 5,
            difficulty_estimation: 4,
            complexity_prediction: 4,
            pattern_recognition: 3,
            optimization_strategy: 3,
            value_estimation: 3,
            security_analysis: 3,
            efficiency_optimization: 4,
        }
    }
}

/// Cadence of the three learning cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Telemetry ingestion period (ms)
    pub ingestion_interval_ms: u64,
    /// Pattern/quality training period (ms)
    pub pattern_interval_ms: u64,
    /// Difficulty/optimisation training period (ms)
    pub optimization_interval_ms: u64,
    /// Batch size per role
    pub batch_sizes: BatchSizes,
    /// Improved models required before tuning parameters are emitted
    pub min_improved_models: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ingestion_interval_ms: 45_000,
            pattern_interval_ms: 60_000,
            optimization_interval_ms: 90_000,
            batch_sizes: BatchSizes::default(),
            min_improved_models: 3,
        }
    }
}

/// Thresholds and factors for deriving mining parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Below this complexity/difficulty ratio difficulty is scaled up
    pub low_ratio: f64,
    /// Above this ratio difficulty is scaled down
    pub high_ratio: f64,
    /// (difficulty multiplier, complexity adjustment) for a low ratio
    pub low_ratio_factors: (f64, f64),
    /// (difficulty multiplier, complexity adjustment) for a high ratio
    pub high_ratio_factors: (f64, f64),
    /// Divisor turning value/time efficiency into a reward bonus
    pub efficiency_scale: f64,
    /// Lower clamp for the reward-efficiency bonus
    pub bonus_min: f64,
    /// Upper clamp for the reward-efficiency bonus
    pub bonus_max: f64,
    /// Correlation summary above which mining difficulty is raised
    pub correlation_threshold: f64,
    /// Mining adjustment when correlation is high
    pub mining_raise: f64,
    /// Mining adjustment otherwise
    pub mining_lower: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            low_ratio: 0.8,
            high_ratio: 1.5,
            low_ratio_factors: (1.2, 0.9),
            high_ratio_factors: (0.8, 1.1),
            efficiency_scale: 100.0,
            bonus_min: 0.5,
            bonus_max: 2.0,
            correlation_threshold: 0.7,
            mining_raise: 1.1,
            mining_lower: 0.9,
        }
    }
}
