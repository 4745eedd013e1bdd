//! Trust score record and the six relay-verification test families.

use serde::{Deserialize, Serialize};

/// Weighted components combined into the `overall` trust score.
///
/// `overall = 0.3*reputation + 0.4*behavior + 0.2*consensus + 0.1*recency`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TrustScore {
    pub reputation: f64,
    pub behavior: f64,
    pub consensus: f64,
    pub recency: f64,
    pub overall: f64,
    pub confidence: f64,
    pub last_updated: u64,
}

pub const REPUTATION_WEIGHT: f64 = 0.3;
pub const BEHAVIOR_WEIGHT: f64 = 0.4;
pub const CONSENSUS_WEIGHT: f64 = 0.2;
pub const RECENCY_WEIGHT: f64 = 0.1;

impl TrustScore {
    pub fn zero(now: u64) -> Self {
        Self {
            reputation: 0.0,
            behavior: 0.0,
            consensus: 0.0,
            recency: 0.0,
            overall: 0.0,
            confidence: 0.0,
            last_updated: now,
        }
    }

    /// Recompute `overall` from the four weighted components.
    pub fn recompute_overall(&mut self) {
        self.overall = REPUTATION_WEIGHT * self.reputation
            + BEHAVIOR_WEIGHT * self.behavior
            + CONSENSUS_WEIGHT * self.consensus
            + RECENCY_WEIGHT * self.recency;
    }
}

/// Trust promotion/demotion bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBand {
    Untrusted,
    Medium,
    High,
}

impl TrustBand {
    pub fn from_overall(overall: f64, low_threshold: f64, high_threshold: f64) -> Self {
        if overall >= high_threshold {
            TrustBand::High
        } else if overall >= low_threshold {
            TrustBand::Medium
        } else {
            TrustBand::Untrusted
        }
    }
}

/// The six weighted verification test families, run blind (the verifier
/// never observes plaintext).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VerificationTest {
    BlindMessage,
    RoutingAccuracy,
    TimingConsistency,
    TrafficPattern,
    Consensus,
    ProofOfRelay,
}

impl VerificationTest {
    /// Suggested weight in the weighted sum. `ProofOfRelay` is a
    /// pass/fail gate rather than a weighted contributor, so it carries
    /// no weight here.
    pub fn weight(self) -> f64 {
        match self {
            VerificationTest::BlindMessage => 0.30,
            VerificationTest::RoutingAccuracy => 0.25,
            VerificationTest::TimingConsistency => 0.20,
            VerificationTest::TrafficPattern => 0.15,
            VerificationTest::Consensus => 0.10,
            VerificationTest::ProofOfRelay => 0.0,
        }
    }
}
