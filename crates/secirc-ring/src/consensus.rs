//! Consensus proposals for admitting new ring members.

use std::collections::HashMap;

use secirc_types::Hash16;

/// A cast vote: `true` is yes, `false` is no.
pub type Vote = bool;

/// The result of tallying a proposal's votes against the current
/// membership and the admission quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalOutcome {
    Pending,
    Accepted,
    Rejected,
}

/// A single `add_member` consensus proposal.
#[derive(Clone, Debug)]
pub struct Proposal {
    pub id: String,
    pub candidate: Hash16,
    pub proposer: Hash16,
    pub opened_ts: u64,
    pub votes: HashMap<Hash16, Vote>,
    pub resolved: Option<ProposalOutcome>,
}

impl Proposal {
    pub fn new(id: impl Into<String>, candidate: Hash16, proposer: Hash16, opened_ts: u64) -> Self {
        Self {
            id: id.into(),
            candidate,
            proposer,
            opened_ts,
            votes: HashMap::new(),
            resolved: None,
        }
    }

    /// Records `voter`'s vote. Returns `false` if `voter` had already
    /// voted on this proposal (the new vote is ignored).
    pub fn cast_vote(&mut self, voter: Hash16, vote: Vote) -> bool {
        if self.votes.contains_key(&voter) {
            return false;
        }
        self.votes.insert(voter, vote);
        true
    }

    pub fn yes_count(&self) -> usize {
        self.votes.values().filter(|v| **v).count()
    }

    pub fn is_expired(&self, now: u64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.opened_ts) > ttl_secs
    }

    /// Tallies the proposal against `total_members` and `quorum`
    /// (fraction of yes-votes required). Does not mutate `resolved`;
    /// callers decide when to commit a result.
    pub fn tally(&self, total_members: usize, quorum: f64) -> ProposalOutcome {
        if total_members == 0 {
            return ProposalOutcome::Pending;
        }
        let yes_fraction = self.yes_count() as f64 / total_members as f64;
        if yes_fraction >= quorum {
            ProposalOutcome::Accepted
        } else if self.votes.len() == total_members {
            ProposalOutcome::Rejected
        } else {
            ProposalOutcome::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_vote_is_ignored() {
        let mut p = Proposal::new("p1", [1u8; 16], [2u8; 16], 0);
        assert!(p.cast_vote([3u8; 16], true));
        assert!(!p.cast_vote([3u8; 16], false));
        assert_eq!(p.yes_count(), 1);
    }

    #[test]
    fn test_tally_reaches_quorum() {
        let mut p = Proposal::new("p1", [1u8; 16], [2u8; 16], 0);
        p.cast_vote([1u8; 16], true);
        p.cast_vote([2u8; 16], true);
        p.cast_vote([3u8; 16], false);
        assert_eq!(p.tally(4, 0.75), ProposalOutcome::Pending);
        p.cast_vote([4u8; 16], true);
        assert_eq!(p.tally(4, 0.75), ProposalOutcome::Accepted);
    }

    #[test]
    fn test_tally_rejects_when_all_voted_below_quorum() {
        let mut p = Proposal::new("p1", [1u8; 16], [2u8; 16], 0);
        p.cast_vote([1u8; 16], true);
        p.cast_vote([2u8; 16], false);
        p.cast_vote([3u8; 16], false);
        assert_eq!(p.tally(3, 0.75), ProposalOutcome::Rejected);
    }

    #[test]
    fn test_expiry() {
        let p = Proposal::new("p1", [1u8; 16], [2u8; 16], 1000);
        assert!(!p.is_expired(1500, 600));
        assert!(p.is_expired(1700, 600));
    }
}
