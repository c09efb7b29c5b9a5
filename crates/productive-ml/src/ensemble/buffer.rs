//! Bounded FIFO buffer of training samples

use crate::features::TrainingSample;
use std::collections::VecDeque;

/// Most recent training samples for one model
///
/// Holds at most `capacity` samples; pushing past capacity evicts the oldest.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<TrainingSample>,
    capacity: usize,
    total_seen: usize,
}

impl SampleBuffer {
    /// Create an empty buffer
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total_seen: 0,
        }
    }

    /// Append a sample, evicting the oldest entries past capacity
    pub fn push(&mut self, sample: TrainingSample) {
        self.total_seen += 1;
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Up to `n` most recent samples, oldest first
    pub fn recent(&self, n: usize) -> Vec<TrainingSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).cloned().collect()
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of buffered samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples pushed over the buffer's lifetime, including evicted ones
    pub fn total_seen(&self) -> usize {
        self.total_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(v: f32) -> TrainingSample {
        TrainingSample::new(vec![v], vec![v])
    }

    #[test]
    fn test_evicts_oldest() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..5 {
            buffer.push(sample(i as f32));
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.total_seen(), 5);
        let values: Vec<f32> = buffer.recent(10).iter().map(|s| s.features[0]).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_recent_takes_tail_in_order() {
        let mut buffer = SampleBuffer::new(10);
        for i in 0..6 {
            buffer.push(sample(i as f32));
        }
        let values: Vec<f32> = buffer.recent(2).iter().map(|s| s.features[0]).collect();
        assert_eq!(values, vec![4.0, 5.0]);
        assert!(SampleBuffer::new(4).recent(3).is_empty());
    }
}
