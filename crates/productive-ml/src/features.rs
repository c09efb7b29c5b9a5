//! Feature normalisation
//!
//! Each role reads a fixed, ordered list of telemetry fields. Every field is
//! min-max scaled into [0,1] with a hard-coded range; problem categories are
//! one-hot encoded against [`ProblemCategory::ALL`].
//!
//! The field tables are static, so a role's feature width is known without
//! looking at any telemetry and can be checked against its architecture once
//! when the ensemble is built.

use crate::error::{MlError, Result};
use crate::role::ModelRole;
use crate::telemetry::{ProblemCategory, SolutionTelemetry};
use serde::{Deserialize, Serialize};

/// A (features, target) pair for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Normalised inputs
    pub features: Vec<f32>,
    /// Expected outputs, each in [0,1]
    pub target: Vec<f32>,
}

impl TrainingSample {
    /// Pair features with a target
    pub fn new(features: Vec<f32>, target: Vec<f32>) -> Self {
        Self { features, target }
    }
}

/// Scale `value` from `[min, max]` into [0,1], clamping out-of-range values
#[inline]
pub fn normalize(value: f64, min: f64, max: f64) -> f32 {
    if max <= min || value.is_nan() {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
}

/// One-hot encoding of a category name; unknown names encode as all zeros
pub fn one_hot(category: &str) -> [f32; ProblemCategory::COUNT] {
    let mut encoding = [0.0; ProblemCategory::COUNT];
    if let Some(c) = ProblemCategory::from_name(category) {
        encoding[c.index()] = 1.0;
    }
    encoding
}

/// A scalar telemetry field with its normalisation range
#[derive(Clone, Copy)]
pub struct FeatureField {
    /// Human-readable field name
    pub name: &'static str,
    extract: fn(&SolutionTelemetry) -> f64,
    min: f64,
    max: f64,
}

impl FeatureField {
    const fn new(
        name: &'static str,
        extract: fn(&SolutionTelemetry) -> f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name,
            extract,
            min,
            max,
        }
    }

    /// Normalised value of this field
    pub fn read(&self, telemetry: &SolutionTelemetry) -> f32 {
        normalize((self.extract)(telemetry), self.min, self.max)
    }

    /// Normalisation range
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Shared prefix of every role's feature vector
static COMMON: [FeatureField; 18] = [
    FeatureField::new("block_height", |t| t.blockchain.block_height as f64, 0.0, 1000.0),
    FeatureField::new("chain_difficulty", |t| t.blockchain.difficulty, 1.0, 10.0),
    FeatureField::new("hash_rate", |t| t.blockchain.hash_rate, 0.0, 100.0),
    FeatureField::new("active_miners", |t| t.blockchain.active_miners as f64, 0.0, 100.0),
    FeatureField::new("solution_difficulty", |t| t.solution.difficulty, 1.0, 10.0),
    FeatureField::new("expected_value", |t| t.solution.expected_value, 0.0, 1000.0),
    FeatureField::new("computation_time", |t| t.solution.computation_time, 0.0, 3600.0),
    FeatureField::new("solutions_found", |t| t.mining.solutions_found as f64, 0.0, 20.0),
    FeatureField::new("average_time", |t| t.mining.average_time, 0.0, 3600.0),
    FeatureField::new("success_rate", |t| t.mining.success_rate, 0.0, 1.0),
    FeatureField::new("recognition_rate", |t| t.patterns.recognition_rate, 0.0, 1.0),
    FeatureField::new("pattern_complexity", |t| t.patterns.pattern_complexity, 0.0, 5.0),
    FeatureField::new("convergence_rate", |t| t.optimization.convergence_rate, 0.0, 1.0),
    FeatureField::new("improvement_rate", |t| t.optimization.improvement_rate, 0.0, 1.0),
    FeatureField::new("stability_score", |t| t.optimization.stability_score, 0.0, 1.0),
    FeatureField::new("discovery_rate", |t| t.discovery.discovery_rate, 0.0, 1.0),
    FeatureField::new("total_discoveries", |t| t.discovery.total_discoveries as f64, 0.0, 100.0),
    FeatureField::new("discovery_count", |t| t.discovery.discoveries.len() as f64, 0.0, 10.0),
];

/// Security analysis reads only the first part of the common block
const SECURITY_PREFIX: usize = 14;

static QUALITY_EXTRAS: [FeatureField; 5] = [
    FeatureField::new("quality_score", |t| t.solution.quality_score, 0.0, 1.0),
    FeatureField::new("complexity", |t| t.solution.complexity, 0.0, 10.0),
    FeatureField::new("mathematical_depth", |t| t.patterns.mathematical_depth, 0.0, 10.0),
    FeatureField::new("novelty_score", |t| t.patterns.novelty_score, 0.0, 1.0),
    FeatureField::new("adaptation_speed", |t| t.optimization.adaptation_speed, 0.0, 1.0),
];

static COMPLEXITY_EXTRAS: [FeatureField; 3] = [
    FeatureField::new("complexity", |t| t.solution.complexity, 0.0, 10.0),
    FeatureField::new("mathematical_depth", |t| t.patterns.mathematical_depth, 0.0, 10.0),
    FeatureField::new("pattern_complexity", |t| t.patterns.pattern_complexity, 0.0, 5.0),
];

static PATTERN_EXTRAS: [FeatureField; 10] = [
    FeatureField::new("recognition_rate", |t| t.patterns.recognition_rate, 0.0, 1.0),
    FeatureField::new("pattern_complexity", |t| t.patterns.pattern_complexity, 0.0, 5.0),
    FeatureField::new("mathematical_depth", |t| t.patterns.mathematical_depth, 0.0, 10.0),
    FeatureField::new("novelty_score", |t| t.patterns.novelty_score, 0.0, 1.0),
    FeatureField::new("quality_score", |t| t.solution.quality_score, 0.0, 1.0),
    FeatureField::new("complexity", |t| t.solution.complexity, 0.0, 10.0),
    FeatureField::new("spatial", |t| t.solution.optimizations.spatial, 0.0, 1.0),
    FeatureField::new("temporal", |t| t.solution.optimizations.temporal, 0.0, 1.0),
    FeatureField::new("mathematical", |t| t.solution.optimizations.mathematical, 0.0, 1.0),
    FeatureField::new(
        "discovery_difficulty",
        |t| t.discovery.mean_difficulty().unwrap_or(1.0),
        1.0,
        10.0,
    ),
];

static OPTIMIZATION_EXTRAS: [FeatureField; 7] = [
    FeatureField::new("spatial", |t| t.solution.optimizations.spatial, 0.0, 1.0),
    FeatureField::new("temporal", |t| t.solution.optimizations.temporal, 0.0, 1.0),
    FeatureField::new("mathematical", |t| t.solution.optimizations.mathematical, 0.0, 1.0),
    FeatureField::new("security", |t| t.solution.optimizations.security, 0.0, 1.0),
    FeatureField::new("efficiency", |t| t.solution.optimizations.efficiency, 0.0, 1.0),
    FeatureField::new("convergence_rate", |t| t.optimization.convergence_rate, 0.0, 1.0),
    FeatureField::new("stability_score", |t| t.optimization.stability_score, 0.0, 1.0),
];

static VALUE_EXTRAS: [FeatureField; 1] = [FeatureField::new(
    "quality_score",
    |t| t.solution.quality_score,
    0.0,
    1.0,
)];

static EFFICIENCY_EXTRAS: [FeatureField; 4] = [
    FeatureField::new("energy_efficiency", |t| t.mining.energy_efficiency, 0.0, 1.0),
    FeatureField::new("efficiency", |t| t.solution.optimizations.efficiency, 0.0, 1.0),
    FeatureField::new("adaptation_speed", |t| t.optimization.adaptation_speed, 0.0, 1.0),
    FeatureField::new("recognition_rate", |t| t.patterns.recognition_rate, 0.0, 1.0),
];

/// Ordered field list read for `role`
pub fn fields(role: ModelRole) -> impl Iterator<Item = &'static FeatureField> {
    let (common, extras): (&'static [FeatureField], &'static [FeatureField]) = match role {
        ModelRole::SolutionQuality => (&COMMON, &QUALITY_EXTRAS),
        ModelRole::DifficultyEstimation => (&COMMON, &[]),
        ModelRole::ComplexityPrediction => (&COMMON, &COMPLEXITY_EXTRAS),
        ModelRole::PatternRecognition => (&COMMON, &PATTERN_EXTRAS),
        ModelRole::OptimizationStrategy => (&COMMON, &OPTIMIZATION_EXTRAS),
        ModelRole::ValueEstimation => (&COMMON, &VALUE_EXTRAS),
        ModelRole::SecurityAnalysis => (&COMMON[..SECURITY_PREFIX], &[]),
        ModelRole::EfficiencyOptimization => (&COMMON, &EFFICIENCY_EXTRAS),
    };
    common.iter().chain(extras.iter())
}

/// Number of features produced for `role`
pub fn feature_width(role: ModelRole) -> usize {
    fields(role).count()
}

/// Number of target components produced for `role`
pub fn target_width(role: ModelRole) -> usize {
    match role {
        ModelRole::PatternRecognition => ProblemCategory::COUNT,
        ModelRole::OptimizationStrategy => 5,
        ModelRole::EfficiencyOptimization => 3,
        _ => 1,
    }
}

/// Check that every role's feature and target widths match its architecture
pub fn check_widths() -> Result<()> {
    for role in ModelRole::ALL {
        let arch = role.architecture();
        let width = feature_width(role);
        if width != arch.input_dim {
            return Err(MlError::dimension_mismatch(
                format!("{} feature table", role),
                arch.input_dim,
                width,
            ));
        }
        let targets = target_width(role);
        if targets != arch.output_dim {
            return Err(MlError::dimension_mismatch(
                format!("{} target table", role),
                arch.output_dim,
                targets,
            ));
        }
    }
    Ok(())
}

/// Feature vector for `role`
pub fn features(role: ModelRole, telemetry: &SolutionTelemetry) -> Vec<f32> {
    fields(role).map(|f| f.read(telemetry)).collect()
}

/// Target vector for `role`, clamped to [0,1]
pub fn targets(role: ModelRole, telemetry: &SolutionTelemetry) -> Vec<f32> {
    let s = &telemetry.solution;
    let o = &s.optimizations;
    let raw: Vec<f64> = match role {
        ModelRole::SolutionQuality => vec![s.quality_score],
        ModelRole::DifficultyEstimation => return vec![normalize(s.difficulty, 1.0, 10.0)],
        ModelRole::ComplexityPrediction => return vec![normalize(s.complexity, 0.0, 10.0)],
        ModelRole::PatternRecognition => return one_hot(&s.category).to_vec(),
        ModelRole::OptimizationStrategy => o.as_array().to_vec(),
        ModelRole::ValueEstimation => return vec![normalize(s.expected_value, 0.0, 1000.0)],
        ModelRole::SecurityAnalysis => vec![o.security],
        ModelRole::EfficiencyOptimization => vec![o.spatial, o.temporal, o.mathematical],
    };
    raw.into_iter().map(|v| normalize(v, 0.0, 1.0)).collect()
}

/// Training sample for `role`
pub fn sample(role: ModelRole, telemetry: &SolutionTelemetry) -> TrainingSample {
    TrainingSample::new(features(role, telemetry), targets(role, telemetry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::SyntheticTelemetry;
    use approx::assert_relative_eq;

    #[test]
    fn test_widths_match_architectures() {
        check_widths().unwrap();
        assert_eq!(feature_width(ModelRole::SecurityAnalysis), 14);
        assert_eq!(feature_width(ModelRole::PatternRecognition), 28);
    }

    #[test]
    fn test_normalize_clamps() {
        assert_relative_eq!(normalize(5.0, 1.0, 10.0), 4.0 / 9.0);
        assert_eq!(normalize(-3.0, 0.0, 1.0), 0.0);
        assert_eq!(normalize(3000.0, 0.0, 1000.0), 1.0);
        assert_eq!(normalize(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(normalize(1.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn test_one_hot() {
        let enc = one_hot("yang_mills");
        assert_eq!(enc.iter().sum::<f32>(), 1.0);
        assert_eq!(enc[ProblemCategory::YangMills.index()], 1.0);
        assert!(one_hot("collatz").iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_samples_in_unit_range() {
        let source = SyntheticTelemetry::new(5);
        for _ in 0..50 {
            let t = source.generate();
            for role in ModelRole::ALL {
                let s = sample(role, &t);
                let arch = role.architecture();
                assert_eq!(s.features.len(), arch.input_dim);
                assert_eq!(s.target.len(), arch.output_dim);
                assert!(s.features.iter().chain(s.target.iter()).all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn test_features_are_deterministic() {
        let t = SyntheticTelemetry::new(8).generate();
        for role in ModelRole::ALL {
            assert_eq!(features(role, &t), features(role, &t));
        }
    }

    #[test]
    fn test_security_uses_common_prefix() {
        let t = SyntheticTelemetry::new(2).generate();
        let common = features(ModelRole::DifficultyEstimation, &t);
        let security = features(ModelRole::SecurityAnalysis, &t);
        assert_eq!(&common[..14], security.as_slice());
    }

    #[test]
    fn test_difficulty_target() {
        let mut t = SyntheticTelemetry::new(4).generate();
        t.solution.difficulty = 5.0;
        let target = targets(ModelRole::DifficultyEstimation, &t);
        assert_relative_eq!(target[0], 0.444_444, epsilon = 1e-5);
    }
}
