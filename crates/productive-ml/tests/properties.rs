//! Property tests for the network, normaliser and pattern analyzer

use approx::assert_relative_eq;
use productive_ml::features;
use productive_ml::patterns::PatternAnalyzer;
use productive_ml::telemetry::{OptimizationScores, SolutionDescriptor};
use productive_ml::{DenseNetwork, MlError, ModelRole, SyntheticTelemetry, TrainingParams};
use proptest::prelude::*;

fn role_strategy() -> impl Strategy<Value = ModelRole> {
    (0..ModelRole::COUNT).prop_map(|i| ModelRole::ALL[i])
}

fn solution(category: &str, difficulty: f64, value: f64, time: f64) -> SolutionDescriptor {
    SolutionDescriptor {
        category: category.to_string(),
        difficulty,
        expected_value: value,
        computation_time: time,
        quality_score: 0.5,
        complexity: 5.0,
        optimizations: OptimizationScores {
            spatial: 0.5,
            temporal: 0.5,
            mathematical: 0.5,
            security: 0.5,
            efficiency: 0.5,
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_forward_width_or_mismatch(
        role in role_strategy(),
        len in 0usize..40,
        seed in any::<u64>(),
    ) {
        let arch = role.architecture();
        let (input_dim, output_dim) = (arch.input_dim, arch.output_dim);
        let mut net = DenseNetwork::new(arch, TrainingParams::default(), seed).unwrap();
        let input = vec![0.5f32; len];

        match net.forward(&input, true) {
            Ok(out) => {
                prop_assert_eq!(len, input_dim);
                prop_assert_eq!(out.len(), output_dim);
                prop_assert!(out.iter().all(|v| v.is_finite()));
            }
            Err(MlError::DimensionMismatch { expected, actual, .. }) => {
                prop_assert_ne!(len, input_dim);
                prop_assert_eq!(expected, input_dim);
                prop_assert_eq!(actual, len);
            }
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }

    #[test]
    fn prop_train_outcome_bounds(
        role in role_strategy(),
        seed in any::<u64>(),
        fill in -5.0f32..5.0,
        target in 0.0f32..1.0,
    ) {
        let arch = role.architecture();
        let input = vec![fill; arch.input_dim];
        let target = vec![target; arch.output_dim];
        let mut net = DenseNetwork::new(arch, TrainingParams::default(), seed).unwrap();

        for _ in 0..5 {
            let outcome = net.train(&input, &target).unwrap();
            prop_assert!(outcome.loss >= 0.0);
            prop_assert!(outcome.loss.is_finite());
            prop_assert!((0.0..=1.0).contains(&outcome.accuracy));
        }
    }

    #[test]
    fn prop_features_in_unit_range(seed in any::<u64>(), role in role_strategy()) {
        let t = SyntheticTelemetry::new(seed).generate();
        let sample = features::sample(role, &t);
        prop_assert_eq!(sample.features.len(), role.architecture().input_dim);
        prop_assert!(sample.features.iter().all(|v| (0.0..=1.0).contains(v)));
        prop_assert!(sample.target.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn prop_category_average_order_independent(
        records in prop::collection::vec((1.0f64..10.0, 100.0f64..1100.0, 60.0f64..3660.0), 1..40)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let (original, shuffled) = records;
        let mut a = PatternAnalyzer::new(100);
        let mut b = PatternAnalyzer::new(100);
        for (d, v, t) in &original {
            a.record(&solution("riemann_zero", *d, *v, *t));
        }
        for (d, v, t) in &shuffled {
            b.record(&solution("riemann_zero", *d, *v, *t));
        }

        let ca = a.category("riemann_zero").unwrap();
        let cb = b.category("riemann_zero").unwrap();
        prop_assert_eq!(ca.solutions, cb.solutions);
        assert_relative_eq!(ca.avg_difficulty, cb.avg_difficulty, max_relative = 1e-9);
        assert_relative_eq!(ca.avg_value, cb.avg_value, max_relative = 1e-9);
        assert_relative_eq!(ca.avg_time, cb.avg_time, max_relative = 1e-9);

        let mean = original.iter().map(|r| r.0).sum::<f64>() / original.len() as f64;
        assert_relative_eq!(ca.avg_difficulty, mean, max_relative = 1e-9);
    }
}

/// Plain gradient descent: default learning rate and L2, no momentum or dropout
fn gradient_descent_params() -> TrainingParams {
    TrainingParams {
        momentum: 0.0,
        dropout: 0.0,
        ..TrainingParams::default()
    }
}

#[test]
fn test_loss_strictly_decreases_for_every_role() {
    let telemetry = SyntheticTelemetry::new(42).generate();

    for role in ModelRole::ALL {
        let sample = features::sample(role, &telemetry);
        let mut net =
            DenseNetwork::new(role.architecture(), gradient_descent_params(), 42).unwrap();

        let mut previous = net.train(&sample.features, &sample.target).unwrap().loss;
        for step in 0..50 {
            let loss = net.train(&sample.features, &sample.target).unwrap().loss;
            assert!(
                loss < previous,
                "{}: loss went from {} to {} at step {}",
                role,
                previous,
                loss,
                step
            );
            previous = loss;
        }
    }
}

#[test]
fn test_momentum_default_still_converges_for_every_role() {
    let telemetry = SyntheticTelemetry::new(42).generate();
    let params = TrainingParams {
        dropout: 0.0,
        ..TrainingParams::default()
    };

    for role in ModelRole::ALL {
        let sample = features::sample(role, &telemetry);
        let mut net = DenseNetwork::new(role.architecture(), params.clone(), 42).unwrap();

        let first = net.train(&sample.features, &sample.target).unwrap().loss;
        let mut last = first;
        for _ in 0..200 {
            last = net.train(&sample.features, &sample.target).unwrap().loss;
        }
        assert!(last < first, "{}: loss {} -> {}", role, first, last);
    }
}
