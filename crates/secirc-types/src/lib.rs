//! # secirc-types
//!
//! Shared domain types for the secIRC relay core. Every structure here
//! corresponds 1:1 to an entity in the data model: identities, relay
//! nodes, first-ring members, trust scores, groups and group keys,
//! pending messages, auth sessions, and user presence.

pub mod auth;
pub mod events;
pub mod group;
pub mod identity;
pub mod network;
pub mod presence;
pub mod trust;

/// A 16-byte identity hash: `hash16 == SHA256(public_key)[0..16]`.
pub type Hash16 = [u8; 16];

/// A 32-byte hash (envelope integrity hash, group hash input, etc.).
pub type Hash32 = [u8; 32];

pub type GroupId = [u8; 32];
pub type MessageId = [u8; 16];
pub type SessionId = [u8; 16];

/// Default maximum age for an envelope timestamp before it is rejected
/// as stale, in seconds.
pub const DEFAULT_MAX_MESSAGE_AGE_SECS: u64 = 300;

/// Size of the per-type replay window (number of sequence numbers kept).
pub const REPLAY_WINDOW_SIZE: usize = 1000;

/// First-ring membership bounds.
pub const MIN_RING_SIZE: usize = 3;
pub const MAX_RING_SIZE: usize = 12;

/// Fraction of yes-votes required to admit a first-ring candidate.
pub const RING_ADMISSION_QUORUM: f64 = 0.75;

/// Consensus proposal expiry, in seconds (10 minutes).
pub const RING_PROPOSAL_TTL_SECS: u64 = 600;

/// Default presence timeout before a user is marked offline, in seconds.
pub const DEFAULT_PRESENCE_TIMEOUT_SECS: u64 = 300;

/// Default maximum delivery attempts for a pending message.
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Default pending-message TTL, in seconds (1 hour).
pub const DEFAULT_MESSAGE_TTL_SECS: u64 = 3600;

/// Default group key rotation interval, in seconds (24 hours).
pub const DEFAULT_KEY_ROTATION_INTERVAL_SECS: u64 = 86400;

/// Default proof-of-work difficulty: leading zero bits required.
pub const DEFAULT_POW_DIFFICULTY: u32 = 4;

/// Closed set of wire message types, with an escape hatch for forward
/// compatibility across protocol versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Datagram,
    RelayControl,
    GroupPost,
    KeyChange,
    Challenge,
    Presence,
    Discovery,
    /// Any type not yet known to this build, carrying its raw wire tag.
    Other(u16),
}

impl MessageType {
    /// The domain-separation label mixed into the envelope salt and
    /// integrity hash for this message type.
    pub fn domain_string(&self) -> String {
        match self {
            MessageType::Datagram => "secirc-v1 type-datagram".to_string(),
            MessageType::RelayControl => "secirc-v1 type-relay-control".to_string(),
            MessageType::GroupPost => "secirc-v1 type-group".to_string(),
            MessageType::KeyChange => "secirc-v1 type-key-change".to_string(),
            MessageType::Challenge => "secirc-v1 type-challenge".to_string(),
            MessageType::Presence => "secirc-v1 type-presence".to_string(),
            MessageType::Discovery => "secirc-v1 type-discovery".to_string(),
            MessageType::Other(tag) => format!("secirc-v1 type-other-{tag}"),
        }
    }

    /// The wire tag for this message type.
    pub fn wire_tag(&self) -> u16 {
        match self {
            MessageType::Datagram => 0,
            MessageType::RelayControl => 1,
            MessageType::GroupPost => 2,
            MessageType::KeyChange => 3,
            MessageType::Challenge => 4,
            MessageType::Presence => 5,
            MessageType::Discovery => 6,
            MessageType::Other(tag) => *tag,
        }
    }

    /// Reconstruct a `MessageType` from its wire tag.
    pub fn from_wire_tag(tag: u16) -> Self {
        match tag {
            0 => MessageType::Datagram,
            1 => MessageType::RelayControl,
            2 => MessageType::GroupPost,
            3 => MessageType::KeyChange,
            4 => MessageType::Challenge,
            5 => MessageType::Presence,
            6 => MessageType::Discovery,
            other => MessageType::Other(other),
        }
    }
}
