//! The eight fixed model roles and their network architectures.

use crate::network::Activation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight prediction tasks the ensemble trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelRole {
    /// Solution quality score
    SolutionQuality,
    /// Normalised problem difficulty
    DifficultyEstimation,
    /// Normalised computational complexity
    ComplexityPrediction,
    /// Problem category (one output per category)
    PatternRecognition,
    /// Five optimisation dimensions
    OptimizationStrategy,
    /// Normalised expected value
    ValueEstimation,
    /// Security sub-score
    SecurityAnalysis,
    /// Spatial, temporal and mathematical efficiency
    EfficiencyOptimization,
}

impl ModelRole {
    /// Number of roles
    pub const COUNT: usize = 8;

    /// All roles in slot order
    pub const ALL: [ModelRole; Self::COUNT] = [
        ModelRole::SolutionQuality,
        ModelRole::DifficultyEstimation,
        ModelRole::ComplexityPrediction,
        ModelRole::PatternRecognition,
        ModelRole::OptimizationStrategy,
        ModelRole::ValueEstimation,
        ModelRole::SecurityAnalysis,
        ModelRole::EfficiencyOptimization,
    ];

    /// Roles trained by the pattern-training cycle
    pub const PATTERN_CYCLE: [ModelRole; 3] = [
        ModelRole::PatternRecognition,
        ModelRole::OptimizationStrategy,
        ModelRole::SolutionQuality,
    ];

    /// Roles trained by the optimisation-training cycle
    pub const OPTIMIZATION_CYCLE: [ModelRole; 5] = [
        ModelRole::DifficultyEstimation,
        ModelRole::ComplexityPrediction,
        ModelRole::ValueEstimation,
        ModelRole::SecurityAnalysis,
        ModelRole::EfficiencyOptimization,
    ];

    /// Slot index of this role
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier, matching the serialized form
    pub fn name(self) -> &'static str {
        match self {
            ModelRole::SolutionQuality => "solutionQuality",
            ModelRole::DifficultyEstimation => "difficultyEstimation",
            ModelRole::ComplexityPrediction => "complexityPrediction",
            ModelRole::PatternRecognition => "patternRecognition",
            ModelRole::OptimizationStrategy => "optimizationStrategy",
            ModelRole::ValueEstimation => "valueEstimation",
            ModelRole::SecurityAnalysis => "securityAnalysis",
            ModelRole::EfficiencyOptimization => "efficiencyOptimization",
        }
    }

    /// Fixed network shape for this role
    pub fn architecture(self) -> Architecture {
        let (input_dim, hidden, output_dim, activation): (usize, &[usize], usize, Activation) =
            match self {
                ModelRole::SolutionQuality => (23, &[32, 16, 8], 1, Activation::Swish),
                ModelRole::DifficultyEstimation => (18, &[24, 12], 1, Activation::LeakyRelu),
                ModelRole::ComplexityPrediction => (21, &[28, 14, 7], 1, Activation::Tanh),
                ModelRole::PatternRecognition => (28, &[40, 20, 10], 9, Activation::Sigmoid),
                ModelRole::OptimizationStrategy => (25, &[35, 18, 9], 5, Activation::Swish),
                ModelRole::ValueEstimation => (19, &[26, 13], 1, Activation::LeakyRelu),
                ModelRole::SecurityAnalysis => (14, &[22, 11], 1, Activation::Sigmoid),
                ModelRole::EfficiencyOptimization => (22, &[30, 15], 3, Activation::Tanh),
            };

        Architecture {
            input_dim,
            hidden: hidden.to_vec(),
            output_dim,
            activation,
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layer widths and activation of a dense network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Input width
    pub input_dim: usize,
    /// Hidden layer widths, in order
    pub hidden: Vec<usize>,
    /// Output width
    pub output_dim: usize,
    /// Activation applied at every layer
    pub activation: Activation,
}

impl Architecture {
    /// Full width list: input, hidden..., output
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden.len() + 2);
        sizes.push(self.input_dim);
        sizes.extend_from_slice(&self.hidden);
        sizes.push(self.output_dim);
        sizes
    }
}
