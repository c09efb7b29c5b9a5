//! Bounded history of ingested solutions

use crate::ensemble::PredictionMap;
use crate::recommend::Recommendation;
use crate::telemetry::SolutionTelemetry;
use serde::{Deserialize, Serialize};

/// One ingested snapshot with the predictions made for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    #[serde(flatten)]
    pub telemetry: SolutionTelemetry,
    pub predictions: PredictionMap,
    pub recommendations: Vec<Recommendation>,
}

/// Solution records, trimmed from the front in fixed batches once over capacity
#[derive(Debug, Clone)]
pub struct SolutionHistory {
    records: Vec<SolutionRecord>,
    capacity: usize,
    trim_batch: usize,
}

impl SolutionHistory {
    /// `trim_batch` is clamped to at least one record
    pub fn new(capacity: usize, trim_batch: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
            trim_batch: trim_batch.max(1),
        }
    }

    /// Append a record; drops the oldest `trim_batch` records when over capacity
    pub fn push(&mut self, record: SolutionRecord) {
        self.records.push(record);
        while self.records.len() > self.capacity {
            let n = self.trim_batch.min(self.records.len());
            self.records.drain(..n);
        }
    }

    pub fn latest(&self) -> Option<&SolutionRecord> {
        self.records.last()
    }

    /// Up to `n` most recent records, oldest first
    pub fn recent(&self, n: usize) -> &[SolutionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::SyntheticTelemetry;

    fn record(source: &SyntheticTelemetry) -> SolutionRecord {
        SolutionRecord {
            telemetry: source.generate(),
            predictions: PredictionMap::new(),
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn test_trims_in_batches() {
        let source = SyntheticTelemetry::new(1);
        let mut history = SolutionHistory::new(10, 4);
        for _ in 0..10 {
            history.push(record(&source));
        }
        assert_eq!(history.len(), 10);

        history.push(record(&source));
        assert_eq!(history.len(), 7);
    }

    #[test]
    fn test_recent_and_latest() {
        let source = SyntheticTelemetry::new(2);
        let mut history = SolutionHistory::new(10, 2);
        assert!(history.latest().is_none());

        let mut last = None;
        for _ in 0..3 {
            let r = record(&source);
            last = Some(r.telemetry.blockchain.block_height);
            history.push(r);
        }
        assert_eq!(history.recent(2).len(), 2);
        assert_eq!(history.recent(20).len(), 3);
        assert_eq!(
            history.latest().map(|r| r.telemetry.blockchain.block_height),
            last
        );
    }

    #[test]
    fn test_record_serializes_flat() {
        let source = SyntheticTelemetry::new(3);
        let json = serde_json::to_value(record(&source)).unwrap();
        assert!(json.get("blockchain").is_some());
        assert!(json.get("predictions").is_some());
    }
}
