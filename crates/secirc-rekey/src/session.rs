//! A single key-rotation session, as tracked by one participant.

use std::collections::HashMap;

use secirc_crypto::ed25519::VerifyingKey;
use secirc_types::Hash16;

use crate::{RekeyError, Result};

/// A 128-bit rotation session identifier.
pub type RotationId = [u8; 16];

/// Phase of an in-flight key rotation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPhase {
    Idle,
    Initiated,
    KeyGeneration,
    KeyDistribution,
    Acknowledgment,
    Verification,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Default)]
struct PeerState {
    acked: bool,
    verified: bool,
}

/// Tracks one rotation, as seen by the initiator or by a peer who
/// joined it by receiving `key_change_init`.
pub struct RotationSession {
    pub id: RotationId,
    pub initiator: Hash16,
    pub old_key_hash: Hash16,
    pub new_key: VerifyingKey,
    pub phase: RotationPhase,
    pub started_ts: u64,
    pub timeout_secs: u64,
    peers: HashMap<Hash16, PeerState>,
}

impl RotationSession {
    pub fn initiate(
        id: RotationId,
        initiator: Hash16,
        old_key_hash: Hash16,
        new_key: VerifyingKey,
        peers: impl IntoIterator<Item = Hash16>,
        now: u64,
        timeout_secs: u64,
    ) -> Self {
        Self {
            id,
            initiator,
            old_key_hash,
            new_key,
            phase: RotationPhase::Initiated,
            started_ts: now,
            timeout_secs,
            peers: peers.into_iter().map(|p| (p, PeerState::default())).collect(),
        }
    }

    pub fn is_timed_out(&self, now: u64) -> bool {
        !matches!(self.phase, RotationPhase::Completed | RotationPhase::Failed)
            && now.saturating_sub(self.started_ts) > self.timeout_secs
    }

    pub fn fail(&mut self) {
        self.phase = RotationPhase::Failed;
    }

    fn require_phase(&self, expected: RotationPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RekeyError::WrongPhase(self.phase))
        }
    }

    pub fn begin_key_generation(&mut self) -> Result<()> {
        self.require_phase(RotationPhase::Initiated)?;
        self.phase = RotationPhase::KeyGeneration;
        Ok(())
    }

    pub fn begin_distribution(&mut self) -> Result<()> {
        self.require_phase(RotationPhase::KeyGeneration)?;
        self.phase = RotationPhase::KeyDistribution;
        Ok(())
    }

    pub fn begin_acknowledgment(&mut self) -> Result<()> {
        self.require_phase(RotationPhase::KeyDistribution)?;
        self.phase = RotationPhase::Acknowledgment;
        Ok(())
    }

    /// Records `key_change_ack` from `peer`, verified by the caller
    /// under the peer's *old* key before calling this. Returns `true`
    /// once every peer has acked.
    pub fn record_ack(&mut self, peer: Hash16) -> Result<bool> {
        self.require_phase(RotationPhase::Acknowledgment)?;
        let state = self
            .peers
            .get_mut(&peer)
            .ok_or(RekeyError::UnknownPeer(peer))?;
        state.acked = true;
        Ok(self.peers.values().all(|p| p.acked))
    }

    pub fn begin_verification(&mut self) -> Result<()> {
        self.require_phase(RotationPhase::Acknowledgment)?;
        if !self.peers.values().all(|p| p.acked) {
            return Err(RekeyError::WrongPhase(self.phase));
        }
        self.phase = RotationPhase::Verification;
        Ok(())
    }

    /// Records `key_change_verify` from `peer`, verified by the caller
    /// under the peer's *new* key. Returns `true` once every peer has
    /// been verified under its new key, at which point it is safe for
    /// the caller to atomically swap `current_keys`.
    pub fn record_verified(&mut self, peer: Hash16) -> Result<bool> {
        self.require_phase(RotationPhase::Verification)?;
        let state = self
            .peers
            .get_mut(&peer)
            .ok_or(RekeyError::UnknownPeer(peer))?;
        state.verified = true;
        let all_verified = self.peers.values().all(|p| p.verified);
        if all_verified {
            self.phase = RotationPhase::Completed;
        }
        Ok(all_verified)
    }

    /// The invariant guarding new-key usage: a peer's new key is only
    /// safe to rely on once this session has recorded a valid message
    /// signed under it.
    pub fn peer_new_key_verified(&self, peer: &Hash16) -> bool {
        self.peers.get(peer).is_some_and(|p| p.verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secirc_crypto::ed25519::KeyPair;

    fn session(peers: &[Hash16]) -> RotationSession {
        let new_key = KeyPair::generate().verifying_key;
        RotationSession::initiate([0u8; 16], [1u8; 16], [9u8; 16], new_key, peers.iter().copied(), 0, 300)
    }

    #[test]
    fn test_happy_path_completes() {
        let peers = [[2u8; 16], [3u8; 16]];
        let mut s = session(&peers);
        s.begin_key_generation().unwrap();
        s.begin_distribution().unwrap();
        s.begin_acknowledgment().unwrap();
        assert!(!s.record_ack([2u8; 16]).unwrap());
        assert!(s.record_ack([3u8; 16]).unwrap());
        s.begin_verification().unwrap();
        assert!(!s.record_verified([2u8; 16]).unwrap());
        assert!(s.record_verified([3u8; 16]).unwrap());
        assert_eq!(s.phase, RotationPhase::Completed);
        assert!(s.peer_new_key_verified(&[2u8; 16]));
    }

    #[test]
    fn test_out_of_order_transition_rejected() {
        let mut s = session(&[[2u8; 16]]);
        let err = s.begin_distribution().unwrap_err();
        assert!(matches!(err, RekeyError::WrongPhase(RotationPhase::Initiated)));
    }

    #[test]
    fn test_unknown_peer_ack_rejected() {
        let mut s = session(&[[2u8; 16]]);
        s.begin_key_generation().unwrap();
        s.begin_distribution().unwrap();
        s.begin_acknowledgment().unwrap();
        let err = s.record_ack([99u8; 16]).unwrap_err();
        assert!(matches!(err, RekeyError::UnknownPeer(_)));
    }

    #[test]
    fn test_verification_requires_full_acknowledgment() {
        let mut s = session(&[[2u8; 16], [3u8; 16]]);
        s.begin_key_generation().unwrap();
        s.begin_distribution().unwrap();
        s.begin_acknowledgment().unwrap();
        s.record_ack([2u8; 16]).unwrap();
        assert!(s.begin_verification().is_err());
    }

    #[test]
    fn test_timeout_detection() {
        let s = session(&[[2u8; 16]]);
        assert!(!s.is_timed_out(100));
        assert!(s.is_timed_out(400));
    }
}
