//! The first ring itself: membership table, join handshake, and the
//! status machine that tracks ring health.

use std::collections::HashMap;

use secirc_types::network::FirstRingMember;
use secirc_types::{Hash16, MAX_RING_SIZE, MIN_RING_SIZE, RING_ADMISSION_QUORUM};

use crate::consensus::{Proposal, ProposalOutcome};
use crate::{RingError, Result};

/// Health/lifecycle state of the first ring as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingStatus {
    Forming,
    Active,
    Expanding,
    Maintenance,
    Degraded,
}

/// What a candidate's `ring_join_request` is answered with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Already a member; here is the current roster.
    Accepted(Vec<Hash16>),
    /// Must solve the attached challenge before a proposal can open.
    ChallengeRequired { challenge_id: String },
}

/// The first ring: a self-contained membership table plus whatever
/// admission proposals are currently open.
pub struct FirstRing {
    pub status: RingStatus,
    pub leader: Hash16,
    members: HashMap<Hash16, FirstRingMember>,
    proposals: HashMap<String, Proposal>,
    pub min_ring_size: usize,
    pub max_ring_size: usize,
    pub admission_quorum: f64,
    pub proposal_ttl_secs: u64,
    pub heartbeat_timeout_secs: u64,
    pub removal_grace_secs: u64,
    /// Set once the ring first reaches `min_ring_size`. Distinguishes
    /// "still growing toward quorum for the first time" (admission
    /// proposals stay open) from "lost quorum after having it" (§4.4's
    /// "stops accepting new members until recovery").
    ever_active: bool,
}

impl FirstRing {
    /// Bootstraps a brand-new ring with exactly one member: the local
    /// node, which becomes its own leader.
    pub fn bootstrap(self_id: Hash16, now: u64) -> Self {
        let mut members = HashMap::new();
        members.insert(self_id, FirstRingMember::new(self_id, now));
        // A solo bootstrap is below min_ring_size, so it starts
        // Degraded rather than Forming. Unlike a ring that degrades
        // after losing quorum, this Degraded state doesn't block
        // admission proposals -- see `open_proposal`.
        let status = if members.len() < MIN_RING_SIZE { RingStatus::Degraded } else { RingStatus::Forming };
        Self {
            status,
            leader: self_id,
            members,
            proposals: HashMap::new(),
            min_ring_size: MIN_RING_SIZE,
            max_ring_size: MAX_RING_SIZE,
            admission_quorum: RING_ADMISSION_QUORUM,
            proposal_ttl_secs: 600,
            heartbeat_timeout_secs: 300,
            removal_grace_secs: 60,
            ever_active: false,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &Hash16> {
        self.members.keys()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, id: &Hash16) -> bool {
        self.members.contains_key(id)
    }

    /// Step 2 of the join handshake: a candidate either is already a
    /// member, or must solve the given challenge before the ring will
    /// consider an admission proposal for it.
    pub fn request_join(&self, candidate: Hash16, challenge_id: impl Into<String>) -> JoinOutcome {
        if self.members.contains_key(&candidate) {
            JoinOutcome::Accepted(self.members.keys().copied().collect())
        } else {
            JoinOutcome::ChallengeRequired {
                challenge_id: challenge_id.into(),
            }
        }
    }

    /// Step 4: any member opens a consensus proposal once the
    /// candidate's challenge response has been verified elsewhere
    /// (see `secirc-auth`). Applies the lexicographic tie-break: a
    /// later proposal for the same candidate is only accepted if its
    /// id sorts before the currently active one.
    pub fn open_proposal(
        &mut self,
        id: impl Into<String>,
        candidate: Hash16,
        proposer: Hash16,
        now: u64,
    ) -> Result<()> {
        if self.status == RingStatus::Degraded && self.ever_active {
            return Err(RingError::Degraded);
        }
        if self.members.len() >= self.max_ring_size {
            return Err(RingError::RingFull(self.max_ring_size));
        }
        let id = id.into();
        if let Some(existing) = self.active_proposal_for(&candidate) {
            if id < existing.id {
                let old_id = existing.id.clone();
                self.proposals.remove(&old_id);
            } else {
                return Err(RingError::DuplicateProposal);
            }
        }
        self.proposals
            .insert(id.clone(), Proposal::new(id, candidate, proposer, now));
        Ok(())
    }

    fn active_proposal_for(&self, candidate: &Hash16) -> Option<&Proposal> {
        self.proposals
            .values()
            .find(|p| p.resolved.is_none() && p.candidate == *candidate)
    }

    /// Step 5: a member casts a yes/no vote. Once quorum is reached
    /// the candidate is admitted immediately; once it becomes
    /// mathematically unreachable (or every member has voted without
    /// reaching it) the proposal is rejected.
    pub fn cast_vote(
        &mut self,
        proposal_id: &str,
        voter: Hash16,
        vote: bool,
        now: u64,
    ) -> Result<ProposalOutcome> {
        if !self.members.contains_key(&voter) {
            return Err(RingError::NotAMember(voter));
        }
        let total_members = self.members.len();
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| RingError::ProposalExpired(proposal_id.to_string()))?;
        if proposal.resolved.is_some() {
            return Err(RingError::ProposalResolved(proposal_id.to_string()));
        }
        if proposal.is_expired(now, self.proposal_ttl_secs) {
            proposal.resolved = Some(ProposalOutcome::Rejected);
            return Err(RingError::ProposalExpired(proposal_id.to_string()));
        }
        proposal.cast_vote(voter, vote);
        let outcome = proposal.tally(total_members, self.admission_quorum);
        if outcome != ProposalOutcome::Pending {
            proposal.resolved = Some(outcome);
        }
        if outcome == ProposalOutcome::Accepted {
            let candidate = proposal.candidate;
            self.members
                .insert(candidate, FirstRingMember::new(candidate, now));
            self.recompute_status();
        }
        Ok(outcome)
    }

    pub fn record_heartbeat(&mut self, member: &Hash16, now: u64) -> Result<()> {
        self.members
            .get_mut(member)
            .map(|m| m.record_heartbeat(now))
            .ok_or(RingError::NotAMember(*member))
    }

    /// Removes members overdue by more than `heartbeat_timeout_secs +
    /// removal_grace_secs`, then recomputes ring status. Returns the
    /// removed member ids.
    pub fn sweep_heartbeats(&mut self, now: u64) -> Vec<Hash16> {
        let cutoff = self.heartbeat_timeout_secs + self.removal_grace_secs;
        let removed: Vec<Hash16> = self
            .members
            .iter()
            .filter(|(_, m)| m.is_overdue(now, cutoff))
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            self.members.remove(id);
        }
        self.recompute_status();
        removed
    }

    fn recompute_status(&mut self) {
        if self.members.len() < self.min_ring_size {
            self.status = RingStatus::Degraded;
        } else if self.status == RingStatus::Degraded || self.status == RingStatus::Forming {
            self.status = RingStatus::Active;
            self.ever_active = true;
        }
    }
}
