//! # Productive ML
//!
//! Online analytics for a computational mining system. Telemetry snapshots
//! are normalised into per-model training samples, eight small dense
//! networks are trained continuously on the most recent samples, and their
//! predictions are turned into tuning recommendations and parameter updates.
//!
//! ## Components
//!
//! - **Dense network** ([`network`]): momentum SGD with L2, inverted dropout
//!   and learning-rate decay
//! - **Feature normaliser** ([`features`]): fixed min-max field tables per role
//! - **Ensemble** ([`ensemble`]): per-role networks, bounded sample buffers and
//!   performance metrics behind one lock per model
//! - **Pattern analyzer** ([`patterns`]): ratio, efficiency and correlation
//!   statistics with per-category running averages
//! - **Recommendations** ([`recommend`]) and **tuning** ([`tuning`])
//! - **Scheduler** ([`scheduler`]): three periodic cycles with skip-if-busy
//!
//! ### Usage Example
//!
//! ```rust,ignore
//! use productive_ml::{EngineConfig, LearningScheduler, MiningAnalytics};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let engine = Arc::new(MiningAnalytics::new(config)?);
//! let scheduler = Arc::new(LearningScheduler::new(engine.clone()));
//! scheduler.start();
//!
//! let status = engine.get_status();
//! println!("average accuracy: {:.1}%", status.overall.avg_accuracy * 100.0);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod history;
pub mod network;
pub mod patterns;
pub mod recommend;
pub mod role;
pub mod scheduler;
pub mod telemetry;
pub mod tuning;

pub use config::{
    EngineConfig, EnsembleConfig, HistoryConfig, SchedulerConfig, TrainingParams, TuningConfig,
};
pub use engine::{EngineSnapshot, EnsembleStatus, MiningAnalytics, PredictionReport, TrainingReport};
pub use ensemble::{Ensemble, ModelStatus, PerformanceMetrics, Prediction, PredictionMap};
pub use error::{MlError, Result};
pub use features::TrainingSample;
pub use network::{Activation, DenseNetwork, TrainOutcome};
pub use patterns::{PatternAnalyzer, PatternSummary};
pub use recommend::{Priority, Recommendation, RecommendationKind};
pub use role::{Architecture, ModelRole};
pub use scheduler::{CycleKind, CycleOutcome, LearningScheduler, SchedulerStats};
pub use telemetry::{ProblemCategory, SolutionTelemetry, SyntheticTelemetry, TelemetrySource};
pub use tuning::{LoggingParameterSink, ParameterSink, TuningParameters};
