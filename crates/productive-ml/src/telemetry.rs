//! Telemetry schema and sources
//!
//! [`SolutionTelemetry`] is one snapshot of mining state. Live snapshots come
//! from a [`TelemetrySource`]; [`SyntheticTelemetry`] produces seeded
//! snapshots with the same schema when no live source is available.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed, ordered list of problem categories used for one-hot encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    PrimePattern,
    RiemannZero,
    YangMills,
    GoldbachVerification,
    NavierStokes,
    BirchSwinnertonDyer,
    EllipticCurveCrypto,
    LatticeCrypto,
    PoincareConjecture,
}

impl ProblemCategory {
    /// Number of categories
    pub const COUNT: usize = 9;

    /// Categories in encoding order
    pub const ALL: [ProblemCategory; Self::COUNT] = [
        ProblemCategory::PrimePattern,
        ProblemCategory::RiemannZero,
        ProblemCategory::YangMills,
        ProblemCategory::GoldbachVerification,
        ProblemCategory::NavierStokes,
        ProblemCategory::BirchSwinnertonDyer,
        ProblemCategory::EllipticCurveCrypto,
        ProblemCategory::LatticeCrypto,
        ProblemCategory::PoincareConjecture,
    ];

    /// Position in the one-hot encoding
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            ProblemCategory::PrimePattern => "prime_pattern",
            ProblemCategory::RiemannZero => "riemann_zero",
            ProblemCategory::YangMills => "yang_mills",
            ProblemCategory::GoldbachVerification => "goldbach_verification",
            ProblemCategory::NavierStokes => "navier_stokes",
            ProblemCategory::BirchSwinnertonDyer => "birch_swinnerton_dyer",
            ProblemCategory::EllipticCurveCrypto => "elliptic_curve_crypto",
            ProblemCategory::LatticeCrypto => "lattice_crypto",
            ProblemCategory::PoincareConjecture => "poincare_conjecture",
        }
    }

    /// Look up a category by wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain-level statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainStats {
    pub block_height: u64,
    pub difficulty: f64,
    pub hash_rate: f64,
    pub active_miners: u32,
}

/// Five optimisation sub-scores, each nominally in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationScores {
    pub spatial: f64,
    pub temporal: f64,
    pub mathematical: f64,
    pub security: f64,
    pub efficiency: f64,
}

impl OptimizationScores {
    /// Dimension names in output order of the optimisation-strategy model
    pub const DIMENSIONS: [&'static str; 5] =
        ["spatial", "temporal", "mathematical", "security", "efficiency"];

    /// Scores in [`Self::DIMENSIONS`] order
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.spatial,
            self.temporal,
            self.mathematical,
            self.security,
            self.efficiency,
        ]
    }

    /// Mean of the spatial, temporal and mathematical scores
    pub fn overall(&self) -> f64 {
        (self.spatial + self.temporal + self.mathematical) / 3.0
    }
}

/// Descriptor of the solution currently being mined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDescriptor {
    /// Category wire name; unknown names are allowed and encode as all zeros
    pub category: String,
    pub difficulty: f64,
    pub expected_value: f64,
    /// Seconds
    pub computation_time: f64,
    pub quality_score: f64,
    pub complexity: f64,
    pub optimizations: OptimizationScores,
}

impl SolutionDescriptor {
    /// Parsed category, if it is one of the known names
    pub fn problem_category(&self) -> Option<ProblemCategory> {
        ProblemCategory::from_name(&self.category)
    }
}

/// Aggregate mining statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningStats {
    pub solutions_found: u32,
    /// Seconds
    pub average_time: f64,
    pub success_rate: f64,
    pub energy_efficiency: f64,
}

/// Pattern-recognition statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternStats {
    pub recognition_rate: f64,
    pub pattern_complexity: f64,
    pub mathematical_depth: f64,
    pub novelty_score: f64,
}

/// Optimiser progress statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStats {
    pub convergence_rate: f64,
    pub improvement_rate: f64,
    pub stability_score: f64,
    pub adaptation_speed: f64,
}

/// One discovery event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRecord {
    pub id: u64,
    pub kind: String,
    pub value: f64,
    pub difficulty: f64,
    pub timestamp: DateTime<Utc>,
}

/// Discovery statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStats {
    pub discoveries: Vec<DiscoveryRecord>,
    pub discovery_rate: f64,
    pub total_discoveries: u32,
}

impl DiscoveryStats {
    /// Mean value of the listed discoveries, 0 when empty
    pub fn mean_value(&self) -> f64 {
        if self.discoveries.is_empty() {
            return 0.0;
        }
        self.discoveries.iter().map(|d| d.value).sum::<f64>() / self.discoveries.len() as f64
    }

    /// Mean difficulty of the listed discoveries, `None` when empty
    pub fn mean_difficulty(&self) -> Option<f64> {
        if self.discoveries.is_empty() {
            return None;
        }
        Some(
            self.discoveries.iter().map(|d| d.difficulty).sum::<f64>()
                / self.discoveries.len() as f64,
        )
    }
}

/// One telemetry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionTelemetry {
    pub blockchain: BlockchainStats,
    pub solution: SolutionDescriptor,
    pub mining: MiningStats,
    pub patterns: PatternStats,
    pub optimization: OptimizationStats,
    pub discovery: DiscoveryStats,
    pub timestamp: DateTime<Utc>,
}

/// Supplier of telemetry snapshots
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the current snapshot
    async fn fetch_telemetry(&self) -> Result<SolutionTelemetry>;
}

/// Seeded telemetry generator
///
/// Two generators built from the same seed produce the same sequence of
/// snapshots, apart from timestamps.
pub struct SyntheticTelemetry {
    rng: Mutex<StdRng>,
    next_id: Mutex<u64>,
}

impl SyntheticTelemetry {
    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            next_id: Mutex::new(1),
        }
    }

    /// Produce the next snapshot
    pub fn generate(&self) -> SolutionTelemetry {
        let mut rng = self.rng.lock();
        let now = Utc::now();

        let category = ProblemCategory::ALL[rng.gen_range(0..ProblemCategory::COUNT)];

        let id = {
            let mut next = self.next_id.lock();
            let id = *next;
            *next += 1;
            id
        };

        SolutionTelemetry {
            blockchain: BlockchainStats {
                block_height: rng.gen_range(1..=1000),
                difficulty: rng.gen_range(1..=10) as f64,
                hash_rate: rng.gen_range(0.0..100.0),
                active_miners: rng.gen_range(1..=50),
            },
            solution: SolutionDescriptor {
                category: category.name().to_string(),
                difficulty: rng.gen_range(1..=10) as f64,
                expected_value: rng.gen_range(100..1100) as f64,
                computation_time: rng.gen_range(60..3660) as f64,
                quality_score: rng.gen(),
                complexity: rng.gen_range(0.0..10.0),
                optimizations: OptimizationScores {
                    spatial: rng.gen(),
                    temporal: rng.gen(),
                    mathematical: rng.gen(),
                    security: rng.gen(),
                    efficiency: rng.gen(),
                },
            },
            mining: MiningStats {
                solutions_found: rng.gen_range(0..10),
                average_time: rng.gen_range(300.0..2100.0),
                success_rate: rng.gen(),
                energy_efficiency: rng.gen(),
            },
            patterns: PatternStats {
                recognition_rate: rng.gen(),
                pattern_complexity: rng.gen_range(0.0..5.0),
                mathematical_depth: rng.gen_range(0.0..10.0),
                novelty_score: rng.gen(),
            },
            optimization: OptimizationStats {
                convergence_rate: rng.gen(),
                improvement_rate: rng.gen(),
                stability_score: rng.gen(),
                adaptation_speed: rng.gen(),
            },
            discovery: DiscoveryStats {
                discoveries: vec![DiscoveryRecord {
                    id,
                    kind: "mathematical_pattern".to_string(),
                    value: rng.gen_range(0.0..1000.0),
                    difficulty: rng.gen_range(1..=10) as f64,
                    timestamp: now,
                }],
                discovery_rate: rng.gen_range(0.0..0.1),
                total_discoveries: rng.gen_range(1..=50),
            },
            timestamp: now,
        }
    }
}

impl Default for SyntheticTelemetry {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl TelemetrySource for SyntheticTelemetry {
    async fn fetch_telemetry(&self) -> Result<SolutionTelemetry> {
        Ok(self.generate())
    }
}
