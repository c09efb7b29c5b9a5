//! Scheduler re-entrancy and timer behaviour

use async_trait::async_trait;
use productive_ml::{
    CycleKind, CycleOutcome, EngineConfig, LearningScheduler, MiningAnalytics, Result,
    SchedulerConfig, SolutionTelemetry, SyntheticTelemetry, TelemetrySource,
};
use std::sync::Arc;
use std::time::Duration;

/// Source that takes a while to answer
struct SlowSource {
    delay: Duration,
    inner: SyntheticTelemetry,
}

#[async_trait]
impl TelemetrySource for SlowSource {
    async fn fetch_telemetry(&self) -> Result<SolutionTelemetry> {
        tokio::time::sleep(self.delay).await;
        Ok(self.inner.generate())
    }
}

fn slow_scheduler(delay_ms: u64, config: SchedulerConfig) -> Arc<LearningScheduler> {
    let engine_config = EngineConfig {
        scheduler: config,
        ..EngineConfig::default()
    };
    let engine = MiningAnalytics::new(engine_config)
        .unwrap()
        .with_source(Arc::new(SlowSource {
            delay: Duration::from_millis(delay_ms),
            inner: SyntheticTelemetry::new(5),
        }));
    Arc::new(LearningScheduler::new(Arc::new(engine)))
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_trigger_is_skipped() {
    let scheduler = slow_scheduler(200, SchedulerConfig::default());

    let first = {
        let s = Arc::clone(&scheduler);
        tokio::spawn(async move { s.run_cycle(CycleKind::Ingestion).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        scheduler.run_cycle(CycleKind::Ingestion).await,
        CycleOutcome::Skipped
    );
    // Other cycles are not blocked by a busy ingestion
    assert_eq!(
        scheduler.run_cycle(CycleKind::PatternTraining).await,
        CycleOutcome::Completed
    );

    assert_eq!(first.await.unwrap(), CycleOutcome::Completed);
    let stats = scheduler.stats();
    assert_eq!(stats.ingestion.runs, 1);
    assert_eq!(stats.ingestion.skips, 1);
    assert_eq!(scheduler.engine().history_len(), 1);

    // Once finished the cycle can run again
    assert_eq!(
        scheduler.run_cycle(CycleKind::Ingestion).await,
        CycleOutcome::Completed
    );
    assert_eq!(scheduler.engine().history_len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_cycle_drops_missed_ticks() {
    let config = SchedulerConfig {
        ingestion_interval_ms: 20,
        pattern_interval_ms: 60_000,
        optimization_interval_ms: 60_000,
        ..SchedulerConfig::default()
    };
    let scheduler = slow_scheduler(100, config);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(450)).await;
    scheduler.stop().await;

    let stats = scheduler.stats();
    // Runs start at 20, 120, 220, 320 and 420 ms; backlogged ticks are not replayed
    assert!(stats.ingestion.runs >= 5, "{:?}", stats);
    assert!(stats.ingestion.runs <= 6, "{:?}", stats);
    assert_eq!(stats.ingestion.skips, 0);
    assert_eq!(stats.pattern_training.runs, 0);
    assert!(!stats.running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_without_start_is_noop() {
    let scheduler = slow_scheduler(1, SchedulerConfig::default());
    scheduler.stop().await;
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.stats().ingestion.runs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let config = SchedulerConfig {
        ingestion_interval_ms: 10,
        ..SchedulerConfig::default()
    };
    let scheduler = slow_scheduler(1, config);

    assert!(scheduler.start());
    tokio::time::sleep(Duration::from_millis(60)).await;
    scheduler.stop().await;
    let first = scheduler.stats().ingestion.runs;
    assert!(first >= 1);

    assert!(scheduler.start());
    tokio::time::sleep(Duration::from_millis(60)).await;
    scheduler.stop().await;
    assert!(scheduler.stats().ingestion.runs > first);
}
