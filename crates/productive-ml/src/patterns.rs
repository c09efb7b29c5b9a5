//! Cross-cutting solution statistics
//!
//! The [`PatternAnalyzer`] keeps a bounded, time-ordered list of
//! [`PatternSnapshot`]s and a running-average table per problem category.
//! Neither depends on the neural models.

use crate::telemetry::SolutionDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Similarity of two optimisation scores: 1 when equal, falling linearly
/// with their absolute difference, floored at 0.
#[inline]
pub fn correlation(x: f64, y: f64) -> f64 {
    (1.0 - (x - y).abs()).max(0.0)
}

/// `(old * (n - 1) + value) / n`, where `n` already counts `value`
#[inline]
pub fn running_mean(old: f64, value: f64, n: u64) -> f64 {
    if n == 0 {
        return old;
    }
    let n = n as f64;
    (old * (n - 1.0) + value) / n
}

/// Pairwise similarity of the optimisation sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationCorrelation {
    pub spatial_temporal: f64,
    pub math_security: f64,
    /// Mean of spatial, temporal and mathematical scores
    pub efficiency_overall: f64,
}

/// Running averages for one problem category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub solutions: u64,
    pub avg_difficulty: f64,
    pub avg_value: f64,
    pub avg_time: f64,
}

impl CategoryPerformance {
    fn update(&mut self, solution: &SolutionDescriptor) {
        self.solutions += 1;
        let n = self.solutions;
        self.avg_difficulty = running_mean(self.avg_difficulty, solution.difficulty, n);
        self.avg_value = running_mean(self.avg_value, solution.expected_value, n);
        self.avg_time = running_mean(self.avg_time, solution.computation_time, n);
    }
}

/// Statistics derived from one solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSnapshot {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    /// `complexity / max(difficulty, 1)`
    pub difficulty_complexity_ratio: f64,
    /// `value / max(time, 1)`
    pub value_time_efficiency: f64,
    pub correlation: OptimizationCorrelation,
}

/// Averages over the most recent snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    /// Number of snapshots averaged
    pub samples: usize,
    pub avg_difficulty_complexity_ratio: f64,
    pub avg_value_time_efficiency: f64,
    /// Mean overall optimisation score
    pub avg_optimization_correlation: f64,
}

/// Owner of pattern history and the category table
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    snapshots: VecDeque<PatternSnapshot>,
    categories: BTreeMap<String, CategoryPerformance>,
    capacity: usize,
    total_recorded: u64,
}

impl PatternAnalyzer {
    /// Create an analyzer that keeps at most `capacity` snapshots
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
            categories: BTreeMap::new(),
            capacity,
            total_recorded: 0,
        }
    }

    /// Derive statistics from a solution, update its category and store a snapshot
    pub fn record(&mut self, solution: &SolutionDescriptor) -> PatternSnapshot {
        let o = &solution.optimizations;
        let snapshot = PatternSnapshot {
            timestamp: Utc::now(),
            category: solution.category.clone(),
            difficulty_complexity_ratio: solution.complexity / solution.difficulty.max(1.0),
            value_time_efficiency: solution.expected_value / solution.computation_time.max(1.0),
            correlation: OptimizationCorrelation {
                spatial_temporal: correlation(o.spatial, o.temporal),
                math_security: correlation(o.mathematical, o.security),
                efficiency_overall: o.overall(),
            },
        };

        if !solution.category.is_empty() {
            self.categories
                .entry(solution.category.clone())
                .or_default()
                .update(solution);
        }

        self.total_recorded += 1;
        self.snapshots.push_back(snapshot.clone());
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }

        snapshot
    }

    /// Averages over the last `window` snapshots; `None` when there are none
    pub fn recent_summary(&self, window: usize) -> Option<PatternSummary> {
        let n = window.min(self.snapshots.len());
        if n == 0 {
            return None;
        }

        let recent = self.snapshots.iter().skip(self.snapshots.len() - n);
        let (mut ratio, mut efficiency, mut corr) = (0.0, 0.0, 0.0);
        for s in recent {
            ratio += s.difficulty_complexity_ratio;
            efficiency += s.value_time_efficiency;
            corr += s.correlation.efficiency_overall;
        }

        let count = n as f64;
        Some(PatternSummary {
            samples: n,
            avg_difficulty_complexity_ratio: ratio / count,
            avg_value_time_efficiency: efficiency / count,
            avg_optimization_correlation: corr / count,
        })
    }

    /// Up to `n` most recent snapshots, oldest first
    pub fn recent_snapshots(&self, n: usize) -> Vec<PatternSnapshot> {
        let skip = self.snapshots.len().saturating_sub(n);
        self.snapshots.iter().skip(skip).cloned().collect()
    }

    /// Running averages for one category
    pub fn category(&self, name: &str) -> Option<&CategoryPerformance> {
        self.categories.get(name)
    }

    /// Full category table
    pub fn categories(&self) -> &BTreeMap<String, CategoryPerformance> {
        &self.categories
    }

    /// Stored snapshot count
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if no snapshot is stored
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots recorded over the analyzer's lifetime
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::OptimizationScores;
    use approx::assert_relative_eq;

    fn solution(category: &str, difficulty: f64, complexity: f64) -> SolutionDescriptor {
        SolutionDescriptor {
            category: category.to_string(),
            difficulty,
            expected_value: 600.0,
            computation_time: 300.0,
            quality_score: 0.8,
            complexity,
            optimizations: OptimizationScores {
                spatial: 0.9,
                temporal: 0.6,
                mathematical: 0.3,
                security: 0.3,
                efficiency: 0.5,
            },
        }
    }

    #[test]
    fn test_correlation() {
        assert_relative_eq!(correlation(0.4, 0.4), 1.0);
        assert_relative_eq!(correlation(0.9, 0.6), 0.7, epsilon = 1e-12);
        assert_relative_eq!(correlation(0.0, 1.0), 0.0);
        assert_relative_eq!(correlation(-1.0, 2.0), 0.0);
    }

    #[test]
    fn test_record_derives_statistics() {
        let mut analyzer = PatternAnalyzer::new(10);
        let s = analyzer.record(&solution("prime_pattern", 4.0, 6.0));

        assert_relative_eq!(s.difficulty_complexity_ratio, 1.5);
        assert_relative_eq!(s.value_time_efficiency, 2.0);
        assert_relative_eq!(s.correlation.spatial_temporal, 0.7, epsilon = 1e-12);
        assert_relative_eq!(s.correlation.math_security, 1.0);
        assert_relative_eq!(s.correlation.efficiency_overall, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_ratio_floors_difficulty_at_one() {
        let mut analyzer = PatternAnalyzer::new(10);
        let s = analyzer.record(&solution("prime_pattern", 0.0, 3.0));
        assert_relative_eq!(s.difficulty_complexity_ratio, 3.0);
    }

    #[test]
    fn test_category_running_mean() {
        let mut analyzer = PatternAnalyzer::new(10);
        analyzer.record(&solution("yang_mills", 2.0, 1.0));
        analyzer.record(&solution("yang_mills", 4.0, 1.0));
        analyzer.record(&solution("yang_mills", 9.0, 1.0));
        analyzer.record(&solution("riemann_zero", 7.0, 1.0));

        let ym = analyzer.category("yang_mills").unwrap();
        assert_eq!(ym.solutions, 3);
        assert_relative_eq!(ym.avg_difficulty, 5.0);
        assert_relative_eq!(ym.avg_value, 600.0);
        assert_eq!(analyzer.category("riemann_zero").unwrap().solutions, 1);
        assert!(analyzer.category("navier_stokes").is_none());
    }

    #[test]
    fn test_summary_window() {
        let mut analyzer = PatternAnalyzer::new(10);
        assert!(analyzer.recent_summary(5).is_none());

        analyzer.record(&solution("prime_pattern", 1.0, 10.0));
        analyzer.record(&solution("prime_pattern", 1.0, 2.0));
        analyzer.record(&solution("prime_pattern", 1.0, 4.0));

        let summary = analyzer.recent_summary(2).unwrap();
        assert_eq!(summary.samples, 2);
        assert_relative_eq!(summary.avg_difficulty_complexity_ratio, 3.0);

        let all = analyzer.recent_summary(50).unwrap();
        assert_eq!(all.samples, 3);
        assert_relative_eq!(all.avg_difficulty_complexity_ratio, 16.0 / 3.0);
        assert!(analyzer.recent_summary(0).is_none());
    }

    #[test]
    fn test_snapshots_are_bounded() {
        let mut analyzer = PatternAnalyzer::new(3);
        for i in 0..7 {
            analyzer.record(&solution("prime_pattern", 1.0, i as f64));
        }
        assert_eq!(analyzer.len(), 3);
        assert_eq!(analyzer.total_recorded(), 7);
        let ratios: Vec<f64> = analyzer
            .recent_snapshots(10)
            .iter()
            .map(|s| s.difficulty_complexity_ratio)
            .collect();
        assert_eq!(ratios, vec![4.0, 5.0, 6.0]);
    }
}
