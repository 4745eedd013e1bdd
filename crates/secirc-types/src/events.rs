//! Daemon-wide observability events, fanned out over the event bus to
//! any subscriber (logs, a management RPC, future tooling).

use serde::{Deserialize, Serialize};

/// Envelope for every daemon-level event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: u64,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // First-ring events
    RingMemberJoined,
    RingMemberRemoved,
    RingProposalOpened,
    RingProposalResolved,
    RingDegraded,

    // Key rotation events
    RotationInitiated,
    RotationCompleted,
    RotationFailed,

    // Trust/verification events
    RelayPromoted,
    RelayDemoted,
    RelayBlocked,

    // Auth/presence events
    UserOnline,
    UserOffline,
    SessionVerified,
    SessionFailed,

    // Group events
    MessagePublished,
    MessageDelivered,
    MessageFailed,
    GroupJoined,
    GroupLeft,
    KeyRotated,
    MessageCleaned,

    // Discovery events
    RelayDiscovered,
    RelayDenylisted,

    // System events
    DaemonStatus,
    ErrorOccurred,
}
