//! Analytics engine
//!
//! [`MiningAnalytics`] composes the ensemble, pattern analyzer and solution
//! history with a telemetry source and a parameter sink. The three cycle
//! methods are what the scheduler drives; everything else is read-only
//! reporting.

use crate::config::EngineConfig;
use crate::ensemble::{Ensemble, ModelStatus, PerformanceMetrics, PredictionMap};
use crate::error::Result;
use crate::features::TrainingSample;
use crate::history::{SolutionHistory, SolutionRecord};
use crate::patterns::{PatternAnalyzer, PatternSnapshot, PatternSummary};
use crate::recommend::{recommend, Recommendation};
use crate::role::ModelRole;
use crate::telemetry::{SolutionTelemetry, SyntheticTelemetry, TelemetrySource};
use crate::tuning::{LoggingParameterSink, ParameterSink, TuningParameters};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one ingestion cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    /// The live source failed and synthetic telemetry was used
    pub used_fallback: bool,
    pub predictions: usize,
    pub recommendations: usize,
    pub history_len: usize,
}

/// Outcome of one training cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    /// Whether each trained model improved past the threshold
    pub results: BTreeMap<ModelRole, bool>,
    pub improved: usize,
    /// Parameters sent to the sink, if the cycle applied any
    pub applied: Option<TuningParameters>,
}

/// Predictions and the recommendations derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub predictions: PredictionMap,
    pub recommendations: Vec<Recommendation>,
}

/// Aggregates across all models and histories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStatus {
    pub avg_accuracy: f32,
    pub total_training_cycles: u64,
    pub solutions_processed: usize,
    pub patterns_recognized: u64,
    pub total_adaptation: f32,
}

/// Discovery figures from the latest solution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySummary {
    pub discovery_rate: f64,
    pub total_discoveries: u32,
    pub recent_discoveries: usize,
    pub avg_discovery_value: f64,
}

/// Point-in-time engine status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleStatus {
    pub timestamp: DateTime<Utc>,
    pub models: Vec<ModelStatus>,
    pub overall: OverallStatus,
    pub patterns: Option<PatternSummary>,
    pub recommendations: Vec<Recommendation>,
    pub discovery: Option<DiscoverySummary>,
}

/// Offline inspection dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub timestamp: DateTime<Utc>,
    pub models: Vec<ModelRole>,
    pub training_data: BTreeMap<ModelRole, Vec<TrainingSample>>,
    pub performance_metrics: BTreeMap<ModelRole, PerformanceMetrics>,
    pub solution_history: Vec<SolutionRecord>,
    pub patterns: Vec<PatternSnapshot>,
}

/// Online analytics engine
pub struct MiningAnalytics {
    config: EngineConfig,
    ensemble: Ensemble,
    patterns: Mutex<PatternAnalyzer>,
    history: Mutex<SolutionHistory>,
    source: Arc<dyn TelemetrySource>,
    fallback: SyntheticTelemetry,
    sink: Arc<dyn ParameterSink>,
}

impl MiningAnalytics {
    /// Build an engine fed by synthetic telemetry and logging its tuning decisions
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.ensemble.seed;
        let ensemble = Ensemble::new(&config)?;

        info!(
            models = ModelRole::COUNT,
            buffer_capacity = config.ensemble.buffer_capacity,
            "Mining analytics engine initialised"
        );

        Ok(Self {
            patterns: Mutex::new(PatternAnalyzer::new(config.history.pattern_capacity)),
            history: Mutex::new(SolutionHistory::new(
                config.history.solution_capacity,
                config.history.trim_batch,
            )),
            source: Arc::new(SyntheticTelemetry::new(seed)),
            fallback: SyntheticTelemetry::new(seed.wrapping_add(1)),
            sink: Arc::new(LoggingParameterSink),
            ensemble,
            config,
        })
    }

    /// Replace the telemetry source
    pub fn with_source(mut self, source: Arc<dyn TelemetrySource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the parameter sink
    pub fn with_sink(mut self, sink: Arc<dyn ParameterSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Fetch one snapshot, ingest it everywhere and append it to history.
    ///
    /// A failing source is replaced by synthetic telemetry for this cycle.
    pub async fn run_ingestion_cycle(&self) -> Result<IngestionReport> {
        let (telemetry, used_fallback) = match self.source.fetch_telemetry().await {
            Ok(t) => (t, false),
            Err(e) => {
                warn!(error = %e, "Telemetry fetch failed, using synthetic snapshot");
                (self.fallback.generate(), true)
            }
        };

        self.ensemble.ingest(&telemetry);
        self.patterns.lock().record(&telemetry.solution);

        let predictions = self.ensemble.predict_all(&telemetry);
        let recommendations = recommend(&predictions, &telemetry);
        let report_counts = (predictions.len(), recommendations.len());

        let history_len = {
            let mut history = self.history.lock();
            history.push(SolutionRecord {
                telemetry,
                predictions,
                recommendations,
            });
            history.len()
        };

        info!(
            history = history_len,
            predictions = report_counts.0,
            recommendations = report_counts.1,
            fallback = used_fallback,
            "Ingestion cycle completed"
        );

        Ok(IngestionReport {
            used_fallback,
            predictions: report_counts.0,
            recommendations: report_counts.1,
            history_len,
        })
    }

    /// Train the pattern, optimisation-strategy and solution-quality models
    pub async fn run_pattern_cycle(&self) -> TrainingReport {
        let results = self.train_roles(&ModelRole::PATTERN_CYCLE).await;
        let improved = results.values().filter(|&&v| v).count();
        info!(
            improved,
            total = results.len(),
            "Pattern training cycle completed"
        );
        TrainingReport {
            results,
            improved,
            applied: None,
        }
    }

    /// Train the five remaining models and push tuning parameters when
    /// enough of them improved.
    pub async fn run_optimization_cycle(&self) -> TrainingReport {
        let results = self.train_roles(&ModelRole::OPTIMIZATION_CYCLE).await;
        let improved = results.values().filter(|&&v| v).count();

        let mut applied = None;
        if improved >= self.config.scheduler.min_improved_models {
            let summary = self
                .patterns
                .lock()
                .recent_summary(self.config.history.optimization_window);
            if let Some(summary) = summary {
                let params = TuningParameters::from_summary(&summary, &self.config.tuning);
                match self.sink.apply_optimizations(&params).await {
                    Ok(()) => applied = Some(params),
                    Err(e) => warn!(error = %e, "Parameter sink rejected optimizations"),
                }
            } else {
                debug!("No pattern history yet, skipping optimizations");
            }
        }

        info!(
            improved,
            total = results.len(),
            applied = applied.is_some(),
            "Optimization training cycle completed"
        );

        TrainingReport {
            results,
            improved,
            applied,
        }
    }

    async fn train_roles(&self, roles: &[ModelRole]) -> BTreeMap<ModelRole, bool> {
        let batch_sizes = &self.config.scheduler.batch_sizes;
        let mut results = BTreeMap::new();
        for &role in roles {
            results.insert(role, self.ensemble.train_batch(role, batch_sizes.get(role)));
            tokio::task::yield_now().await;
        }
        results
    }

    /// Predictions and recommendations for a snapshot, without ingesting it
    pub fn predict(&self, telemetry: &SolutionTelemetry) -> PredictionReport {
        let predictions = self.ensemble.predict_all(telemetry);
        let recommendations = recommend(&predictions, telemetry);
        PredictionReport {
            predictions,
            recommendations,
        }
    }

    /// Recent pattern averages over `window` snapshots
    pub fn pattern_summary(&self, window: usize) -> Option<PatternSummary> {
        self.patterns.lock().recent_summary(window)
    }

    /// Number of stored solution records
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Current status; well formed even before any training
    pub fn get_status(&self) -> EnsembleStatus {
        let models = self.ensemble.status();
        let total_accuracy: f32 = models.iter().map(|m| m.accuracy).sum();
        let total_adaptation: f32 = models.iter().map(|m| m.adaptation_score).sum();
        let total_training_cycles = models.iter().map(|m| m.training_cycles).sum();
        let avg_accuracy = if models.is_empty() {
            0.0
        } else {
            total_accuracy / models.len() as f32
        };

        let (patterns, patterns_recognized) = {
            let analyzer = self.patterns.lock();
            (
                analyzer.recent_summary(self.config.history.status_window),
                analyzer.total_recorded(),
            )
        };

        let history = self.history.lock();
        let latest = history.latest();
        let recommendations = latest
            .map(|r| r.recommendations.clone())
            .unwrap_or_default();
        let discovery = latest.map(|r| {
            let d = &r.telemetry.discovery;
            DiscoverySummary {
                discovery_rate: d.discovery_rate,
                total_discoveries: d.total_discoveries,
                recent_discoveries: d.discoveries.len(),
                avg_discovery_value: d.mean_value(),
            }
        });

        EnsembleStatus {
            timestamp: Utc::now(),
            overall: OverallStatus {
                avg_accuracy,
                total_training_cycles,
                solutions_processed: history.len(),
                patterns_recognized,
                total_adaptation,
            },
            models,
            patterns,
            recommendations,
            discovery,
        }
    }

    /// Trimmed dump of buffers, metrics, history and pattern snapshots
    pub fn snapshot(&self) -> EngineSnapshot {
        let limits = &self.config.history;
        let training_data = ModelRole::ALL
            .iter()
            .map(|&r| (r, self.ensemble.recent_samples(r, limits.export_samples)))
            .collect();
        let performance_metrics = ModelRole::ALL
            .iter()
            .map(|&r| (r, self.ensemble.metrics(r)))
            .collect();

        EngineSnapshot {
            timestamp: Utc::now(),
            models: ModelRole::ALL.to_vec(),
            training_data,
            performance_metrics,
            solution_history: self.history.lock().recent(limits.export_solutions).to_vec(),
            patterns: self.patterns.lock().recent_snapshots(limits.export_patterns),
        }
    }

    /// [`Self::snapshot`] as pretty-printed JSON
    pub fn export_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Write [`Self::export_snapshot`] to `path`
    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.export_snapshot()?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "Snapshot exported");
        Ok(())
    }
}
