//! Relay node and first-ring membership records.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::Hash16;

/// A relay's verification/admission lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayLifecycle {
    Discovered,
    Verified,
    Failed,
    Promoted,
}

/// A relay node in the registry.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayNode {
    pub hash16: Hash16,
    #[serde_as(as = "serde_with::Bytes")]
    pub public_key: [u8; 32],
    pub addr: String,
    pub port: u16,
    pub is_first_ring: bool,
    pub reputation: f64,
    pub last_seen: u64,
    pub challenges_passed: u32,
    pub challenges_failed: u32,
    pub lifecycle: RelayLifecycle,
}

impl RelayNode {
    pub fn new(hash16: Hash16, public_key: [u8; 32], addr: String, port: u16, now: u64) -> Self {
        Self {
            hash16,
            public_key,
            addr,
            port,
            is_first_ring: false,
            reputation: 0.0,
            last_seen: now,
            challenges_passed: 0,
            challenges_failed: 0,
            lifecycle: RelayLifecycle::Discovered,
        }
    }

    pub fn record_challenge(&mut self, passed: bool) {
        if passed {
            self.challenges_passed += 1;
        } else {
            self.challenges_failed += 1;
        }
    }
}

/// A first-ring member: a relay admitted to the trust-anchor ring by
/// consensus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FirstRingMember {
    pub hash16: Hash16,
    pub join_ts: u64,
    pub heartbeat_ts: u64,
    pub consensus_votes_cast: u64,
}

impl FirstRingMember {
    pub fn new(hash16: Hash16, now: u64) -> Self {
        Self {
            hash16,
            join_ts: now,
            heartbeat_ts: now,
            consensus_votes_cast: 0,
        }
    }

    pub fn record_heartbeat(&mut self, now: u64) {
        self.heartbeat_ts = now;
    }

    pub fn is_overdue(&self, now: u64, heartbeat_timeout_secs: u64) -> bool {
        now.saturating_sub(self.heartbeat_ts) > heartbeat_timeout_secs
    }
}

/// A signed relay announcement surfaced by discovery, before it has
/// passed the verification pipeline.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayAnnouncement {
    pub relay_id: Hash16,
    #[serde_as(as = "serde_with::Bytes")]
    pub public_key: [u8; 32],
    pub addr: String,
    pub port: u16,
    pub services: Vec<String>,
    pub capabilities: Vec<String>,
    pub uptime_secs: u64,
    pub last_seen: u64,
    pub version: String,
    #[serde_as(as = "serde_with::Bytes")]
    pub sig: [u8; 64],
}
