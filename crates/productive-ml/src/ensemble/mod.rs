//! Model registry
//!
//! The [`Ensemble`] owns one network, sample buffer and metrics record per
//! [`ModelRole`]. Each role sits behind its own lock, so a training cycle on
//! one model never blocks inference on another, and no caller can observe a
//! half-applied weight update.

mod buffer;
mod metrics;

pub use buffer::SampleBuffer;
pub use metrics::{AdaptationWeights, PerformanceMetrics};

use crate::config::{EngineConfig, EnsembleConfig};
use crate::error::{MlError, Result};
use crate::features::{self, TrainingSample};
use crate::network::DenseNetwork;
use crate::role::ModelRole;
use crate::telemetry::SolutionTelemetry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Output of one model for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Raw network output
    pub value: Vec<f32>,
    /// Tracked accuracy of the model at prediction time
    pub confidence: f32,
    /// Adaptation score of the model at prediction time
    pub adaptation_score: f32,
}

impl Prediction {
    /// First output component
    pub fn scalar(&self) -> f32 {
        self.value.first().copied().unwrap_or(0.0)
    }
}

/// Predictions keyed by role; roles below the confidence floor are absent
pub type PredictionMap = BTreeMap<ModelRole, Prediction>;

/// Reportable state of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub role: ModelRole,
    pub accuracy: f32,
    pub loss: f32,
    pub training_cycles: u64,
    pub best_accuracy: f32,
    pub adaptation_score: f32,
    pub buffer_size: usize,
    pub learning_rate: f32,
    pub last_update: DateTime<Utc>,
}

struct ModelSlot {
    network: DenseNetwork,
    buffer: SampleBuffer,
    metrics: PerformanceMetrics,
}

/// The eight role models with their buffers and metrics
pub struct Ensemble {
    slots: Vec<Mutex<ModelSlot>>,
    weights: Vec<AdaptationWeights>,
    config: EnsembleConfig,
}

impl Ensemble {
    /// Build all eight networks.
    ///
    /// Fails if any role's feature table disagrees with its architecture.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        features::check_widths()?;

        let ensemble_config = config.ensemble.clone();
        let mut slots = Vec::with_capacity(ModelRole::COUNT);
        let mut weights = Vec::with_capacity(ModelRole::COUNT);

        for role in ModelRole::ALL {
            let seed = role_seed(ensemble_config.seed, role);
            let network = DenseNetwork::new(role.architecture(), config.network.clone(), seed)?;
            slots.push(Mutex::new(ModelSlot {
                network,
                buffer: SampleBuffer::new(ensemble_config.buffer_capacity),
                metrics: PerformanceMetrics::default(),
            }));
            weights.push(ensemble_config.adaptation_weights(role));
        }

        debug!(models = slots.len(), seed = ensemble_config.seed, "Ensemble initialised");

        Ok(Self {
            slots,
            weights,
            config: ensemble_config,
        })
    }

    /// Ensemble settings
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Normalise a snapshot for every role and buffer the samples
    pub fn ingest(&self, telemetry: &SolutionTelemetry) {
        for role in ModelRole::ALL {
            let sample = features::sample(role, telemetry);
            self.slot(role).lock().buffer.push(sample);
        }
    }

    /// Train `role` on its `2 * batch_size` most recent samples.
    ///
    /// Returns `true` when tracked accuracy rose by more than the configured
    /// improvement threshold. Returns `false` without training when fewer
    /// than `batch_size` samples are buffered.
    pub fn train_batch(&self, role: ModelRole, batch_size: usize) -> bool {
        let mut slot = self.slot(role).lock();

        if batch_size == 0 || slot.buffer.len() < batch_size {
            debug!(
                model = %role,
                buffered = slot.buffer.len(),
                required = batch_size,
                "Skipping training, not enough samples"
            );
            return false;
        }

        let samples = slot.buffer.recent(batch_size * 2);
        match self.train_slot(&mut slot, role, &samples, batch_size) {
            Ok(improvement) => improvement > self.config.improvement_threshold,
            Err(e) => {
                warn!(model = %role, error = %e, "Training cycle failed");
                false
            }
        }
    }

    /// Train `role` on explicit samples and update its metrics.
    ///
    /// Every sample is checked against the model's widths first; on a
    /// mismatch nothing is trained and the metrics are left as they were.
    /// Returns the change in tracked accuracy.
    pub fn train_on(&self, role: ModelRole, samples: &[TrainingSample]) -> Result<f32> {
        if samples.is_empty() {
            return Err(MlError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let mut slot = self.slot(role).lock();
        let (input_dim, output_dim) = (slot.network.input_dim(), slot.network.output_dim());
        for s in samples {
            if s.features.len() != input_dim {
                return Err(MlError::dimension_mismatch(
                    format!("{} features", role),
                    input_dim,
                    s.features.len(),
                ));
            }
            if s.target.len() != output_dim {
                return Err(MlError::dimension_mismatch(
                    format!("{} target", role),
                    output_dim,
                    s.target.len(),
                ));
            }
        }

        self.train_slot(&mut slot, role, samples, samples.len())
    }

    fn train_slot(
        &self,
        slot: &mut ModelSlot,
        role: ModelRole,
        samples: &[TrainingSample],
        batch_size: usize,
    ) -> Result<f32> {
        let mut total_loss = 0.0;
        let mut total_accuracy = 0.0;
        let mut trained = 0usize;

        for batch in samples.chunks(batch_size.max(1)) {
            for sample in batch {
                match slot.network.train(&sample.features, &sample.target) {
                    Ok(outcome) => {
                        total_loss += outcome.loss;
                        total_accuracy += outcome.accuracy;
                        trained += 1;
                    }
                    Err(e) => warn!(model = %role, error = %e, "Skipping sample"),
                }
            }
        }

        if trained == 0 {
            return Err(MlError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let loss = total_loss / trained as f32;
        let accuracy = total_accuracy / trained as f32;
        let improvement = slot.metrics.record_cycle(
            loss,
            accuracy,
            self.config.metric_smoothing,
            &self.weights[role.index()],
            self.config.cycle_horizon,
        );

        debug!(
            model = %role,
            accuracy = slot.metrics.accuracy,
            loss = slot.metrics.loss,
            cycles = slot.metrics.training_cycles,
            adaptation = slot.metrics.adaptation_score,
            "Model trained"
        );

        Ok(improvement)
    }

    /// Run every model whose tracked accuracy is above the confidence floor
    pub fn predict_all(&self, telemetry: &SolutionTelemetry) -> PredictionMap {
        let mut predictions = PredictionMap::new();
        for role in ModelRole::ALL {
            let slot = self.slot(role).lock();
            if slot.metrics.accuracy <= self.config.confidence_floor {
                continue;
            }
            let input = features::features(role, telemetry);
            match slot.network.predict(&input) {
                Ok(value) => {
                    predictions.insert(
                        role,
                        Prediction {
                            value,
                            confidence: slot.metrics.accuracy,
                            adaptation_score: slot.metrics.adaptation_score,
                        },
                    );
                }
                Err(e) => warn!(model = %role, error = %e, "Prediction failed"),
            }
        }
        predictions
    }

    /// Inference on a prepared feature vector, regardless of confidence
    pub fn predict(&self, role: ModelRole, input: &[f32]) -> Result<Vec<f32>> {
        self.slot(role).lock().network.predict(input)
    }

    /// Copy of a model's metrics
    pub fn metrics(&self, role: ModelRole) -> PerformanceMetrics {
        self.slot(role).lock().metrics.clone()
    }

    /// Number of buffered samples for a model
    pub fn buffer_len(&self, role: ModelRole) -> usize {
        self.slot(role).lock().buffer.len()
    }

    /// Up to `n` most recent buffered samples for a model, oldest first
    pub fn recent_samples(&self, role: ModelRole, n: usize) -> Vec<TrainingSample> {
        self.slot(role).lock().buffer.recent(n)
    }

    /// Reportable state of a model
    pub fn model_status(&self, role: ModelRole) -> ModelStatus {
        let slot = self.slot(role).lock();
        let m = &slot.metrics;
        ModelStatus {
            role,
            accuracy: m.accuracy,
            loss: m.loss,
            training_cycles: m.training_cycles,
            best_accuracy: m.best_accuracy,
            adaptation_score: m.adaptation_score,
            buffer_size: slot.buffer.len(),
            learning_rate: slot.network.learning_rate(),
            last_update: m.last_update,
        }
    }

    /// Reportable state of every model, in role order
    pub fn status(&self) -> Vec<ModelStatus> {
        ModelRole::ALL.iter().map(|&r| self.model_status(r)).collect()
    }

    fn slot(&self, role: ModelRole) -> &Mutex<ModelSlot> {
        &self.slots[role.index()]
    }
}

/// Distinct, reproducible seed per role
fn role_seed(seed: u64, role: ModelRole) -> u64 {
    seed ^ (role.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::SyntheticTelemetry;

    fn ensemble() -> Ensemble {
        Ensemble::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_ingest_fills_every_buffer() {
        let e = ensemble();
        let source = SyntheticTelemetry::new(1);
        for _ in 0..3 {
            e.ingest(&source.generate());
        }
        for role in ModelRole::ALL {
            assert_eq!(e.buffer_len(role), 3);
        }
    }

    #[test]
    fn test_train_batch_needs_enough_samples() {
        let e = ensemble();
        let source = SyntheticTelemetry::new(2);
        e.ingest(&source.generate());
        e.ingest(&source.generate());

        assert!(!e.train_batch(ModelRole::SolutionQuality, 5));
        assert_eq!(e.metrics(ModelRole::SolutionQuality).training_cycles, 0);
        assert!(!e.train_batch(ModelRole::SolutionQuality, 0));
    }

    #[test]
    fn test_train_batch_increments_cycles() {
        let e = ensemble();
        let source = SyntheticTelemetry::new(3);
        for _ in 0..10 {
            e.ingest(&source.generate());
        }
        e.train_batch(ModelRole::EfficiencyOptimization, 4);
        e.train_batch(ModelRole::EfficiencyOptimization, 4);

        let m = e.metrics(ModelRole::EfficiencyOptimization);
        assert_eq!(m.training_cycles, 2);
        assert!((0.0..=1.0).contains(&m.accuracy));
        assert_eq!(e.metrics(ModelRole::SecurityAnalysis).training_cycles, 0);
    }

    #[test]
    fn test_train_on_rejects_mismatch_before_training() {
        let e = ensemble();
        let good = features::sample(
            ModelRole::ValueEstimation,
            &SyntheticTelemetry::new(4).generate(),
        );
        let bad = TrainingSample::new(vec![0.5; 7], vec![0.5]);

        let err = e
            .train_on(ModelRole::ValueEstimation, &[good, bad])
            .unwrap_err();
        assert!(matches!(err, MlError::DimensionMismatch { .. }));
        assert_eq!(e.metrics(ModelRole::ValueEstimation).training_cycles, 0);
    }

    #[test]
    fn test_train_on_empty_is_insufficient() {
        let e = ensemble();
        assert!(matches!(
            e.train_on(ModelRole::SecurityAnalysis, &[]),
            Err(MlError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let t = SyntheticTelemetry::new(5).generate();
        let a = ensemble().predict_all(&t);
        let b = ensemble().predict_all(&t);
        assert_eq!(a, b);
        assert_eq!(a.len(), ModelRole::COUNT);
    }

    #[test]
    fn test_role_seeds_differ() {
        let mut seeds: Vec<u64> = ModelRole::ALL.iter().map(|&r| role_seed(42, r)).collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), ModelRole::COUNT);
    }

    #[test]
    fn test_status_reports_all_models() {
        let e = ensemble();
        let status = e.status();
        assert_eq!(status.len(), ModelRole::COUNT);
        assert!(status.iter().all(|s| s.buffer_size == 0));
        assert!(status.iter().all(|s| s.learning_rate > 0.0));
    }
}
