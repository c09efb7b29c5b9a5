//! Tuning recommendations from model predictions
//!
//! Each rule looks at one or two predictions and emits at most one
//! [`Recommendation`]. A rule whose prediction is missing (the model is
//! below the confidence floor) stays silent.

use crate::ensemble::PredictionMap;
use crate::role::ModelRole;
use crate::telemetry::{OptimizationScores, SolutionTelemetry};
use serde::{Deserialize, Serialize};
use std::fmt;

const QUALITY_FLOOR: f32 = 0.7;
const COMPLEXITY_RATIO: f32 = 1.5;
const BALANCE_SPREAD: f32 = 0.5;
const VALUE_SCALE: f64 = 1000.0;
const VALUE_DEVIATION: f64 = 0.3;
const SECURITY_FLOOR: f32 = 0.6;

/// Urgency of a recommendation; sorts high first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// What a recommendation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    QualityImprovement,
    DifficultyMismatch,
    OptimizationBalance,
    ValueCalibration,
    SecurityEnhancement,
}

impl RecommendationKind {
    /// Wire tag
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationKind::QualityImprovement => "quality_improvement",
            RecommendationKind::DifficultyMismatch => "difficulty_mismatch",
            RecommendationKind::OptimizationBalance => "optimization_balance",
            RecommendationKind::ValueCalibration => "value_calibration",
            RecommendationKind::SecurityEnhancement => "security_enhancement",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actionable suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub description: String,
    pub action: String,
}

impl Recommendation {
    fn new(
        kind: RecommendationKind,
        priority: Priority,
        description: String,
        action: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            description,
            action: action.into(),
        }
    }
}

/// Apply every rule and return the recommendations, highest priority first.
///
/// Rules with equal priority keep their evaluation order.
pub fn recommend(
    predictions: &PredictionMap,
    telemetry: &SolutionTelemetry,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(quality) = predictions.get(&ModelRole::SolutionQuality).map(|p| p.scalar()) {
        if quality < QUALITY_FLOOR {
            out.push(Recommendation::new(
                RecommendationKind::QualityImprovement,
                Priority::High,
                format!(
                    "Solution quality predicted at {:.1}%. Consider optimizing mathematical formulation.",
                    quality * 100.0
                ),
                "increase_complexity_analysis",
            ));
        }
    }

    if let (Some(difficulty), Some(complexity)) = (
        predictions.get(&ModelRole::DifficultyEstimation).map(|p| p.scalar()),
        predictions.get(&ModelRole::ComplexityPrediction).map(|p| p.scalar()),
    ) {
        if complexity > difficulty * COMPLEXITY_RATIO {
            out.push(Recommendation::new(
                RecommendationKind::DifficultyMismatch,
                Priority::Medium,
                format!(
                    "Complexity ({:.1}) exceeds difficulty ({:.1}). Consider rebalancing.",
                    complexity * 10.0,
                    difficulty * 10.0
                ),
                "adjust_difficulty_scaling",
            ));
        }
    }

    if let Some(strategy) = predictions.get(&ModelRole::OptimizationStrategy) {
        if let Some(weakest) = weakest_dimension(&strategy.value) {
            out.push(Recommendation::new(
                RecommendationKind::OptimizationBalance,
                Priority::Medium,
                format!(
                    "{} optimization is significantly lower. Focus on balancing optimization strategies.",
                    weakest
                ),
                format!("improve_{}_optimization", weakest),
            ));
        }
    }

    if let Some(value) = predictions.get(&ModelRole::ValueEstimation).map(|p| p.scalar()) {
        let predicted = value as f64 * VALUE_SCALE;
        let actual = telemetry.solution.expected_value;
        if (predicted - actual).abs() > actual * VALUE_DEVIATION {
            out.push(Recommendation::new(
                RecommendationKind::ValueCalibration,
                Priority::Low,
                format!(
                    "Expected value may need recalibration. Predicted: {:.0}, Current: {}",
                    predicted, actual
                ),
                "recalibrate_value_estimation",
            ));
        }
    }

    if let Some(security) = predictions.get(&ModelRole::SecurityAnalysis).map(|p| p.scalar()) {
        if security < SECURITY_FLOOR {
            out.push(Recommendation::new(
                RecommendationKind::SecurityEnhancement,
                Priority::High,
                format!(
                    "Security score predicted at {:.1}%. Enhance cryptographic measures.",
                    security * 100.0
                ),
                "strengthen_security_protocols",
            ));
        }
    }

    out.sort_by_key(|r| r.priority);
    out
}

/// Name of the lowest dimension when the spread exceeds the balance threshold.
/// Ties resolve to the first dimension.
fn weakest_dimension(scores: &[f32]) -> Option<&'static str> {
    let (min_idx, min) = scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |acc: Option<(usize, f32)>, (i, v)| match acc {
            Some((_, m)) if m <= v => acc,
            _ => Some((i, v)),
        })?;
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if max - min > BALANCE_SPREAD {
        OptimizationScores::DIMENSIONS.get(min_idx).copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::Prediction;
    use crate::telemetry::SyntheticTelemetry;

    fn prediction(value: Vec<f32>) -> Prediction {
        Prediction {
            value,
            confidence: 0.8,
            adaptation_score: 0.5,
        }
    }

    fn telemetry(expected_value: f64) -> SolutionTelemetry {
        let mut t = SyntheticTelemetry::new(1).generate();
        t.solution.expected_value = expected_value;
        t
    }

    #[test]
    fn test_no_predictions_no_recommendations() {
        assert!(recommend(&PredictionMap::new(), &telemetry(500.0)).is_empty());
    }

    #[test]
    fn test_weakest_dimension_named() {
        let mut predictions = PredictionMap::new();
        predictions.insert(
            ModelRole::OptimizationStrategy,
            prediction(vec![0.9, 0.9, 0.9, 0.2, 0.9]),
        );
        let recs = recommend(&predictions, &telemetry(500.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::OptimizationBalance);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].action, "improve_security_optimization");
        assert!(recs[0].description.starts_with("security"));
    }

    #[test]
    fn test_balanced_strategy_is_quiet() {
        assert_eq!(weakest_dimension(&[0.5, 0.6, 0.7, 0.8, 0.9]), None);
        assert_eq!(weakest_dimension(&[0.1, 0.9, 0.1, 0.9, 0.9]), Some("spatial"));
        assert_eq!(weakest_dimension(&[]), None);
    }

    #[test]
    fn test_quality_and_security_thresholds() {
        let mut predictions = PredictionMap::new();
        predictions.insert(ModelRole::SolutionQuality, prediction(vec![0.69]));
        predictions.insert(ModelRole::SecurityAnalysis, prediction(vec![0.61]));
        let recs = recommend(&predictions, &telemetry(500.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::QualityImprovement);

        predictions.insert(ModelRole::SecurityAnalysis, prediction(vec![0.4]));
        let recs = recommend(&predictions, &telemetry(500.0));
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn test_difficulty_mismatch_needs_both() {
        let mut predictions = PredictionMap::new();
        predictions.insert(ModelRole::ComplexityPrediction, prediction(vec![0.9]));
        assert!(recommend(&predictions, &telemetry(500.0)).is_empty());

        predictions.insert(ModelRole::DifficultyEstimation, prediction(vec![0.5]));
        let recs = recommend(&predictions, &telemetry(500.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].action, "adjust_difficulty_scaling");
    }

    #[test]
    fn test_value_deviation() {
        let mut predictions = PredictionMap::new();
        predictions.insert(ModelRole::ValueEstimation, prediction(vec![0.5]));
        assert!(recommend(&predictions, &telemetry(450.0)).is_empty());

        let recs = recommend(&predictions, &telemetry(300.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Low);
    }

    #[test]
    fn test_sorted_by_priority() {
        let mut predictions = PredictionMap::new();
        predictions.insert(ModelRole::ValueEstimation, prediction(vec![0.9]));
        predictions.insert(ModelRole::SecurityAnalysis, prediction(vec![0.1]));
        predictions.insert(
            ModelRole::OptimizationStrategy,
            prediction(vec![0.0, 0.9, 0.9, 0.9, 0.9]),
        );
        let recs = recommend(&predictions, &telemetry(100.0));
        let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_serialized_type_tag() {
        let mut predictions = PredictionMap::new();
        predictions.insert(ModelRole::SecurityAnalysis, prediction(vec![0.1]));
        let recs = recommend(&predictions, &telemetry(100.0));
        let json = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(json["type"], "security_enhancement");
        assert_eq!(json["priority"], "high");
    }
}
