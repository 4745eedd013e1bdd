//! # secirc-envelope
//!
//! The envelope & salt integrity layer every ingress/egress path goes
//! through. Wraps a payload with a fresh per-class salt and a SHA-256
//! integrity hash, and rejects replays via a per-type sequence window.

mod replay;
mod seal;

pub use replay::{ReplayWindow, SequenceAllocator};
pub use seal::{open, seal, Envelope};

use secirc_types::MessageType;

/// Errors from opening an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope")]
    Malformed,
    #[error("integrity hash mismatch")]
    BadIntegrity,
    #[error("envelope timestamp is stale or from the future")]
    Stale,
    #[error("sequence number already observed for this type")]
    Replay,
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// The type-domain label mixed into the integrity hash, re-exported for
/// callers building their own framing on top of [`seal`]/[`open`].
pub fn type_domain_string(message_type: &MessageType) -> String {
    message_type.domain_string()
}
