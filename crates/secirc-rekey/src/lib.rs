//! # secirc-rekey
//!
//! Multi-phase coordinated key rotation across the first ring:
//!
//! ```text
//! Idle -> Initiated -> KeyGeneration -> KeyDistribution
//!      -> Acknowledgment -> Verification -> Completed | Failed
//! ```
//!
//! A session is driven by its initiator and tracked independently by
//! every peer; [`session::RotationSession`] is the state one
//! participant holds for one rotation-id, and [`coordinator::RekeyCoordinator`]
//! fans that out across concurrently-running sessions with a timeout
//! sweep.

pub mod coordinator;
pub mod session;

pub use coordinator::RekeyCoordinator;
pub use session::{RotationId, RotationPhase, RotationSession};

use secirc_types::Hash16;

/// Errors from the key rotation protocol.
#[derive(Debug, thiserror::Error)]
pub enum RekeyError {
    #[error("rotation session is in phase {0:?}, which does not accept this transition")]
    WrongPhase(RotationPhase),
    #[error("peer {0:?} is not part of this rotation session")]
    UnknownPeer(Hash16),
    #[error("rotation session timed out")]
    TimedOut,
    #[error("signature verification failed for peer {0:?}")]
    SignatureInvalid(Hash16),
    #[error("no active rotation session with id {0:?}")]
    NoSuchSession(RotationId),
}

pub type Result<T> = std::result::Result<T, RekeyError>;
