//! Integration test: a relay that fails blind verification tests drops
//! below the low trust threshold and is quarantined -- removed from the
//! known-good set and added to the discovery denylist, which then
//! short-circuits any future announcement for the same relay.

use std::collections::HashMap;

use secirc_discovery::denylist::Denylist;
use secirc_trust::scoring::{
    apply_consensus_vote, apply_reputation_event, apply_verification_round, band, first_ring_initial_score,
    ConsensusVote, ReputationEvent,
};
use secirc_trust::verification::{evaluate_round, VerificationResult};
use secirc_types::trust::{TrustBand, VerificationTest};
use secirc_types::Hash16;

const RELAY: Hash16 = [0xAB; 16];
const LOW_THRESHOLD: f64 = 0.3;
const HIGH_THRESHOLD: f64 = 0.7;
const MINIMUM_TESTS: u32 = 3;

fn failing_round() -> HashMap<VerificationTest, VerificationResult> {
    let mut results = HashMap::new();
    results.insert(VerificationTest::BlindMessage, VerificationResult { passed: false, score: 0.0 });
    results.insert(VerificationTest::RoutingAccuracy, VerificationResult { passed: false, score: 0.0 });
    results.insert(VerificationTest::ProofOfRelay, VerificationResult { passed: false, score: 0.0 });
    results
}

#[test]
fn relay_failing_blind_tests_is_denylisted_and_future_announcements_short_circuit() {
    let mut known_nodes = HashMap::new();
    let mut score = first_ring_initial_score(0);
    let mut denylist = Denylist::new();

    // Run MINIMUM_TESTS blind verification rounds, all failing; each
    // corrupted reply also counts as an anomaly against reputation, and
    // the ring members running the test cast a negative consensus vote.
    for round in 0..MINIMUM_TESTS {
        let now = u64::from(round) * 100;
        let outcome = evaluate_round(&failing_round()).unwrap();
        apply_verification_round(&mut score, outcome, now);
        apply_reputation_event(&mut score, ReputationEvent::AnomalyDetected, now);
        apply_consensus_vote(&mut score, ConsensusVote(-1.0), now);
    }
    known_nodes.insert(RELAY, score);

    let current = known_nodes.get(&RELAY).unwrap();
    assert_eq!(band(current, LOW_THRESHOLD, HIGH_THRESHOLD), TrustBand::Untrusted);
    assert!(current.overall < LOW_THRESHOLD);

    // Quarantine: drop from known_nodes, add to the denylist.
    known_nodes.remove(&RELAY);
    denylist.add(RELAY);

    assert!(!known_nodes.contains_key(&RELAY));
    assert!(denylist.is_denied(&RELAY));

    // A future RelayAnnouncement for the same relay_id short-circuits
    // before any of the pipeline's other checks run.
    assert!(should_short_circuit(&denylist, &RELAY));
}

fn should_short_circuit(denylist: &Denylist, relay_id: &Hash16) -> bool {
    denylist.is_denied(relay_id)
}
