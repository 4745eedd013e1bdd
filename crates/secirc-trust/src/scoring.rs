//! Applies reputation events and verification rounds to a relay's
//! [`TrustScore`], and decays it over time.

use secirc_types::trust::{TrustBand, TrustScore};

use crate::verification::RoundOutcome;

/// Per-day decay rates, applied proportionally to elapsed time.
pub const REPUTATION_DECAY_PER_DAY: f64 = 0.01;
pub const BEHAVIOR_DECAY_PER_DAY: f64 = 0.02;
pub const CONSENSUS_DECAY_PER_DAY: f64 = 0.005;

const SECS_PER_DAY: f64 = 86_400.0;

/// Discrete events that nudge a relay's `reputation` component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReputationEvent {
    MessageRelayed,
    MessageFailed,
    AuthenticationSuccess,
    AuthenticationFailed,
    AnomalyDetected,
    GoodBehavior,
    BadBehavior,
}

impl ReputationEvent {
    /// Signed delta applied to `reputation`, clamped into [0, 1] by
    /// [`apply_reputation_event`].
    pub fn delta(self) -> f64 {
        match self {
            ReputationEvent::MessageRelayed => 0.1,
            ReputationEvent::MessageFailed => -0.2,
            ReputationEvent::AuthenticationSuccess => 0.3,
            ReputationEvent::AuthenticationFailed => -0.5,
            ReputationEvent::AnomalyDetected => -0.4,
            ReputationEvent::GoodBehavior => 0.2,
            ReputationEvent::BadBehavior => -0.3,
        }
    }
}

/// A first-ring member's vote on another relay's trustworthiness, in
/// `[-1.0, 1.0]`.
#[derive(Clone, Copy, Debug)]
pub struct ConsensusVote(pub f64);

/// Initializes a first-ring member's trust score at full trust, per
/// the bootstrap rule: ring members start fully trusted rather than
/// climbing there through events.
pub fn first_ring_initial_score(now: u64) -> TrustScore {
    let mut score = TrustScore::zero(now);
    score.reputation = 1.0;
    score.behavior = 1.0;
    score.consensus = 1.0;
    score.recency = 1.0;
    score.confidence = 1.0;
    score.recompute_overall();
    score
}

pub fn apply_reputation_event(score: &mut TrustScore, event: ReputationEvent, now: u64) {
    score.reputation = (score.reputation + event.delta()).clamp(0.0, 1.0);
    score.last_updated = now;
    score.recompute_overall();
}

/// Folds a consensus vote from a peer into the `consensus` component.
/// The vote's own weight is scaled down to a gentle 0.1 nudge, matching
/// the `CONSENSUS_VOTE` event weight used elsewhere in the protocol.
pub fn apply_consensus_vote(score: &mut TrustScore, vote: ConsensusVote, now: u64) {
    let delta = vote.0.clamp(-1.0, 1.0) * 0.1;
    score.consensus = (score.consensus + delta).clamp(0.0, 1.0);
    score.last_updated = now;
    score.recompute_overall();
}

/// Folds a relay-verification round into `behavior`. The round's gate
/// (`ProofOfRelay`) failing zeroes `behavior` outright rather than
/// averaging it down, since a failed proof of relay is disqualifying.
pub fn apply_verification_round(score: &mut TrustScore, outcome: RoundOutcome, now: u64) {
    score.behavior = if outcome.gate_passed {
        outcome.weighted_score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    score.last_updated = now;
    score.recompute_overall();
}

/// Decays `reputation`, `behavior`, and `consensus` proportionally to
/// the time elapsed since `last_updated`, each at its own daily rate.
/// `recency` is not decayed here — it is expected to be recomputed
/// directly from how long ago the relay was last seen.
pub fn apply_decay(score: &mut TrustScore, now: u64) {
    let elapsed_days = now.saturating_sub(score.last_updated) as f64 / SECS_PER_DAY;
    if elapsed_days <= 0.0 {
        return;
    }
    score.reputation = (score.reputation * (1.0 - REPUTATION_DECAY_PER_DAY * elapsed_days)).max(0.0);
    score.behavior = (score.behavior * (1.0 - BEHAVIOR_DECAY_PER_DAY * elapsed_days)).max(0.0);
    score.consensus = (score.consensus * (1.0 - CONSENSUS_DECAY_PER_DAY * elapsed_days)).max(0.0);
    score.last_updated = now;
    score.recompute_overall();
}

/// Recomputes `recency` from how long ago the relay was last seen:
/// full credit inside `fresh_window_secs`, decaying linearly to zero
/// at `stale_after_secs`.
pub fn recompute_recency(
    score: &mut TrustScore,
    last_seen: u64,
    now: u64,
    fresh_window_secs: u64,
    stale_after_secs: u64,
) {
    let age = now.saturating_sub(last_seen);
    score.recency = if age <= fresh_window_secs {
        1.0
    } else if age >= stale_after_secs {
        0.0
    } else {
        let span = (stale_after_secs - fresh_window_secs).max(1) as f64;
        1.0 - (age - fresh_window_secs) as f64 / span
    };
    score.recompute_overall();
}

pub fn band(score: &TrustScore, low_threshold: f64, high_threshold: f64) -> TrustBand {
    TrustBand::from_overall(score.overall, low_threshold, high_threshold)
}
