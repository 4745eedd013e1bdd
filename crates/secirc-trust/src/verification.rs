//! Runs the six blind relay-verification test families.
//!
//! Five families contribute a weighted score in [0, 1]
//! ([`secirc_types::trust::VerificationTest::weight`]); `ProofOfRelay`
//! is a pass/fail gate that is not part of the weighted sum — failing
//! it fails the whole round regardless of the other five scores.

use std::collections::HashMap;

use secirc_types::trust::VerificationTest;

use crate::{Result, TrustError};

/// The outcome of one test family for one relay.
#[derive(Clone, Copy, Debug)]
pub struct VerificationResult {
    pub passed: bool,
    /// Normalized score in [0, 1] for this test family.
    pub score: f64,
}

/// The outcome of a full round across however many test families were
/// actually run.
#[derive(Clone, Copy, Debug)]
pub struct RoundOutcome {
    /// Weighted sum over the five scoring families, renormalized to
    /// the weight actually covered by `results`.
    pub weighted_score: f64,
    /// `false` if `ProofOfRelay` ran and failed.
    pub gate_passed: bool,
}

/// Folds a set of per-family results into a [`RoundOutcome`].
///
/// Missing families are simply excluded from the weighted sum (their
/// weight doesn't count for or against the relay); a round that omits
/// every scoring family is an error, not a silent zero.
pub fn evaluate_round(results: &HashMap<VerificationTest, VerificationResult>) -> Result<RoundOutcome> {
    if results.is_empty() {
        return Err(TrustError::EmptyRound);
    }
    for (test, result) in results {
        if !(0.0..=1.0).contains(&result.score) {
            return Err(TrustError::OutOfRange {
                name: test_name(*test),
                value: result.score,
            });
        }
    }

    let gate_passed = results
        .get(&VerificationTest::ProofOfRelay)
        .map(|r| r.passed)
        .unwrap_or(true);

    let mut weight_covered = 0.0;
    let mut weighted_sum = 0.0;
    for (test, result) in results {
        if *test == VerificationTest::ProofOfRelay {
            continue;
        }
        weighted_sum += test.weight() * result.score;
        weight_covered += test.weight();
    }
    let weighted_score = if weight_covered > 0.0 {
        weighted_sum / weight_covered
    } else {
        0.0
    };

    Ok(RoundOutcome {
        weighted_score,
        gate_passed,
    })
}

fn test_name(test: VerificationTest) -> &'static str {
    match test {
        VerificationTest::BlindMessage => "blind_message",
        VerificationTest::RoutingAccuracy => "routing_accuracy",
        VerificationTest::TimingConsistency => "timing_consistency",
        VerificationTest::TrafficPattern => "traffic_pattern",
        VerificationTest::Consensus => "consensus",
        VerificationTest::ProofOfRelay => "proof_of_relay",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(score: f64) -> VerificationResult {
        VerificationResult { passed: true, score }
    }

    #[test]
    fn test_full_round_weighted_average() {
        let mut results = HashMap::new();
        results.insert(VerificationTest::BlindMessage, pass(1.0));
        results.insert(VerificationTest::RoutingAccuracy, pass(1.0));
        results.insert(VerificationTest::TimingConsistency, pass(1.0));
        results.insert(VerificationTest::TrafficPattern, pass(1.0));
        results.insert(VerificationTest::Consensus, pass(1.0));
        results.insert(VerificationTest::ProofOfRelay, pass(1.0));
        let outcome = evaluate_round(&results).unwrap();
        assert!((outcome.weighted_score - 1.0).abs() < 1e-9);
        assert!(outcome.gate_passed);
    }

    #[test]
    fn test_failed_gate_does_not_affect_weighted_score() {
        let mut results = HashMap::new();
        results.insert(VerificationTest::BlindMessage, pass(1.0));
        results.insert(
            VerificationTest::ProofOfRelay,
            VerificationResult { passed: false, score: 0.0 },
        );
        let outcome = evaluate_round(&results).unwrap();
        assert!(!outcome.gate_passed);
        assert!((outcome.weighted_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_round_renormalizes() {
        let mut results = HashMap::new();
        results.insert(VerificationTest::BlindMessage, pass(0.5));
        results.insert(VerificationTest::Consensus, pass(1.0));
        let outcome = evaluate_round(&results).unwrap();
        let expected = (0.30 * 0.5 + 0.10 * 1.0) / (0.30 + 0.10);
        assert!((outcome.weighted_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_round_is_an_error() {
        let results = HashMap::new();
        assert!(evaluate_round(&results).is_err());
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let mut results = HashMap::new();
        results.insert(VerificationTest::BlindMessage, pass(1.5));
        assert!(evaluate_round(&results).is_err());
    }
}
