//! # secirc-ring
//!
//! First-ring membership: the set of mutually-authenticated relays
//! acting as the network's trust anchor. Covers the join handshake,
//! consensus voting on new members, and heartbeat-driven health
//! tracking that can degrade the ring when it falls below quorum size.

pub mod consensus;
pub mod heartbeat;
pub mod membership;

pub use consensus::{Proposal, ProposalOutcome, Vote};
pub use heartbeat::HeartbeatMonitor;
pub use membership::{FirstRing, JoinOutcome, RingStatus};

use secirc_types::Hash16;

/// Errors raised by first-ring membership operations.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error("ring is at capacity ({0} members)")]
    RingFull(usize),
    #[error("ring is degraded and is not accepting new members")]
    Degraded,
    #[error("member {0:?} is not part of this ring")]
    NotAMember(Hash16),
    #[error("proposal {0} has already expired")]
    ProposalExpired(String),
    #[error("proposal {0} was already resolved")]
    ProposalResolved(String),
    #[error("a later proposal with the same candidate already exists")]
    DuplicateProposal,
}

pub type Result<T> = std::result::Result<T, RingError>;
