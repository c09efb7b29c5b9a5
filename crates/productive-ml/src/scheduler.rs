//! Periodic learning cycles
//!
//! The [`LearningScheduler`] runs the engine's three cycles on independent
//! tokio intervals. Each cycle has a busy flag: a trigger that arrives while
//! the same cycle is still running is skipped rather than queued.
//!
//! ```rust,ignore
//! let engine = Arc::new(MiningAnalytics::new(EngineConfig::default())?);
//! let scheduler = Arc::new(LearningScheduler::new(engine));
//! scheduler.start();
//! // ...
//! scheduler.stop().await;
//! ```

use crate::config::SchedulerConfig;
use crate::engine::MiningAnalytics;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The three periodic cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// Fetch and ingest telemetry
    Ingestion,
    /// Train pattern, strategy and quality models
    PatternTraining,
    /// Train the remaining models and apply tuning
    OptimizationTraining,
}

impl CycleKind {
    /// All cycles
    pub const ALL: [CycleKind; 3] = [
        CycleKind::Ingestion,
        CycleKind::PatternTraining,
        CycleKind::OptimizationTraining,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Stable name
    pub fn name(self) -> &'static str {
        match self {
            CycleKind::Ingestion => "ingestion",
            CycleKind::PatternTraining => "pattern_training",
            CycleKind::OptimizationTraining => "optimization_training",
        }
    }

    /// Period of this cycle under `config`
    pub fn period(self, config: &SchedulerConfig) -> Duration {
        let ms = match self {
            CycleKind::Ingestion => config.ingestion_interval_ms,
            CycleKind::PatternTraining => config.pattern_interval_ms,
            CycleKind::OptimizationTraining => config.optimization_interval_ms,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion
    Completed,
    /// The same cycle was already running
    Skipped,
    /// The cycle ran and reported an error
    Failed(String),
}

/// Counters for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub runs: u64,
    pub skips: u64,
    pub failures: u64,
}

/// Counters for all cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub ingestion: CycleStats,
    pub pattern_training: CycleStats,
    pub optimization_training: CycleStats,
    pub running: bool,
}

impl SchedulerStats {
    /// Counters for one cycle
    pub fn cycle(&self, kind: CycleKind) -> CycleStats {
        match kind {
            CycleKind::Ingestion => self.ingestion,
            CycleKind::PatternTraining => self.pattern_training,
            CycleKind::OptimizationTraining => self.optimization_training,
        }
    }
}

#[derive(Default)]
struct CycleState {
    busy: AtomicBool,
    runs: AtomicU64,
    skips: AtomicU64,
    failures: AtomicU64,
}

impl CycleState {
    fn stats(&self) -> CycleStats {
        CycleStats {
            runs: self.runs.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Clears a busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives the engine's cycles on timers
pub struct LearningScheduler {
    engine: Arc<MiningAnalytics>,
    config: SchedulerConfig,
    cycles: [CycleState; 3],
    running: AtomicBool,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl LearningScheduler {
    /// Create a stopped scheduler timed by the engine's `scheduler` settings
    pub fn new(engine: Arc<MiningAnalytics>) -> Self {
        let config = engine.config().scheduler.clone();
        Self {
            engine,
            config,
            cycles: Default::default(),
            running: AtomicBool::new(false),
            shutdown_tx: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Engine being driven
    pub fn engine(&self) -> &Arc<MiningAnalytics> {
        &self.engine
    }

    /// Timer settings, taken from the engine configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Spawn the three timer tasks. Returns `false` if already running.
    ///
    /// Each timer first fires one full period after start. Ticks missed
    /// while a cycle runs are dropped.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        let mut handles = self.handles.lock();
        for kind in CycleKind::ALL {
            let scheduler = Arc::clone(self);
            let mut shutdown_rx = shutdown_rx.clone();
            let period = kind.period(&self.config);

            handles.push(tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // The first tick completes immediately
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            scheduler.run_cycle(kind).await;
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                debug!(cycle = %kind, "Cycle task stopping");
                                break;
                            }
                        }
                    }
                }
            }));
        }

        info!(
            ingestion_ms = self.config.ingestion_interval_ms,
            pattern_ms = self.config.pattern_interval_ms,
            optimization_ms = self.config.optimization_interval_ms,
            "Learning scheduler started"
        );
        true
    }

    /// Signal the timer tasks and wait for them to finish
    pub async fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(true);
        }

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cycle task ended abnormally");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Learning scheduler stopped");
    }

    /// Whether the timer tasks are running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle now, unless the same cycle is already in progress
    pub async fn run_cycle(&self, kind: CycleKind) -> CycleOutcome {
        let state = &self.cycles[kind.index()];
        if state.busy.swap(true, Ordering::SeqCst) {
            state.skips.fetch_add(1, Ordering::Relaxed);
            debug!(cycle = %kind, "Previous run still in progress, skipping");
            return CycleOutcome::Skipped;
        }
        let _guard = BusyGuard(&state.busy);

        let outcome = match kind {
            CycleKind::Ingestion => match self.engine.run_ingestion_cycle().await {
                Ok(_) => CycleOutcome::Completed,
                Err(e) => CycleOutcome::Failed(e.to_string()),
            },
            CycleKind::PatternTraining => {
                self.engine.run_pattern_cycle().await;
                CycleOutcome::Completed
            }
            CycleKind::OptimizationTraining => {
                self.engine.run_optimization_cycle().await;
                CycleOutcome::Completed
            }
        };

        state.runs.fetch_add(1, Ordering::Relaxed);
        if let CycleOutcome::Failed(msg) = &outcome {
            state.failures.fetch_add(1, Ordering::Relaxed);
            warn!(cycle = %kind, error = %msg, "Cycle failed");
        }
        outcome
    }

    /// Run and skip counters
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ingestion: self.cycles[CycleKind::Ingestion.index()].stats(),
            pattern_training: self.cycles[CycleKind::PatternTraining.index()].stats(),
            optimization_training: self.cycles[CycleKind::OptimizationTraining.index()].stats(),
            running: self.is_running(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn scheduler(config: SchedulerConfig) -> Arc<LearningScheduler> {
        let engine_config = EngineConfig {
            scheduler: config,
            ..EngineConfig::default()
        };
        let engine = Arc::new(MiningAnalytics::new(engine_config).unwrap());
        Arc::new(LearningScheduler::new(engine))
    }

    #[test]
    fn test_periods_follow_config() {
        let config = SchedulerConfig::default();
        assert_eq!(CycleKind::Ingestion.period(&config), Duration::from_secs(45));
        assert_eq!(CycleKind::PatternTraining.period(&config), Duration::from_secs(60));
        assert_eq!(
            CycleKind::OptimizationTraining.period(&config),
            Duration::from_secs(90)
        );
    }

    #[tokio::test]
    async fn test_manual_cycles_count_runs() {
        let s = scheduler(SchedulerConfig::default());
        assert_eq!(s.run_cycle(CycleKind::Ingestion).await, CycleOutcome::Completed);
        assert_eq!(s.run_cycle(CycleKind::PatternTraining).await, CycleOutcome::Completed);

        let stats = s.stats();
        assert_eq!(stats.ingestion.runs, 1);
        assert_eq!(stats.pattern_training.runs, 1);
        assert_eq!(stats.optimization_training.runs, 0);
        assert!(!stats.running);
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let s = scheduler(SchedulerConfig::default());
        assert!(s.start());
        assert!(!s.start());
        assert!(s.is_running());
        s.stop().await;
        assert!(!s.is_running());
    }

    #[test]
    fn test_timers_follow_engine_config() {
        let config = SchedulerConfig {
            ingestion_interval_ms: 1_500,
            min_improved_models: 1,
            ..SchedulerConfig::default()
        };
        let s = scheduler(config.clone());
        assert_eq!(s.config(), &s.engine().config().scheduler);
        assert_eq!(s.config(), &config);
        assert_eq!(
            CycleKind::Ingestion.period(s.config()),
            Duration::from_millis(1_500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_drive_cycles() {
        let config = SchedulerConfig {
            ingestion_interval_ms: 20,
            pattern_interval_ms: 30,
            optimization_interval_ms: 40,
            ..SchedulerConfig::default()
        };
        let s = scheduler(config);
        s.start();
        tokio::time::sleep(Duration::from_millis(250)).await;
        s.stop().await;

        let stats = s.stats();
        assert!(stats.ingestion.runs >= 2, "{:?}", stats);
        assert!(stats.pattern_training.runs >= 1, "{:?}", stats);
        assert!(stats.optimization_training.runs >= 1, "{:?}", stats);
        assert!(s.engine().history_len() >= 2);
    }
}
