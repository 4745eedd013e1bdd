//! Client authentication challenge and session types.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Hash16, SessionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Challenged,
    Responded,
    Verified,
    Failed,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Signature,
    ProofOfWork,
    Timestamp,
    Nonce,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: u32,
    pub kind: ChallengeKind,
    #[serde_as(as = "serde_with::Bytes")]
    pub blob: Vec<u8>,
    pub issued_ts: u64,
    /// Required leading zero bits, only meaningful for `ProofOfWork`.
    pub difficulty: u32,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenge_id: u32,
    #[serde_as(as = "serde_with::Bytes")]
    pub response: Vec<u8>,
    pub submitted_ts: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub session_id: SessionId,
    pub user_hash: Hash16,
    pub server_hash: Hash16,
    pub status: SessionStatus,
    pub challenges: Vec<Challenge>,
    pub responses: Vec<ChallengeResponse>,
    pub created_ts: u64,
    pub last_activity: u64,
    pub session_key: Option<[u8; 32]>,
}

impl AuthSession {
    pub fn new(session_id: SessionId, user_hash: Hash16, server_hash: Hash16, now: u64) -> Self {
        Self {
            session_id,
            user_hash,
            server_hash,
            status: SessionStatus::Pending,
            challenges: Vec::new(),
            responses: Vec::new(),
            created_ts: now,
            last_activity: now,
            session_key: None,
        }
    }

    pub fn is_expired(&self, now: u64, max_session_age_secs: u64) -> bool {
        now.saturating_sub(self.created_ts) > max_session_age_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_pending() {
        let session = AuthSession::new([0u8; 16], [1u8; 16], [2u8; 16], 1000);
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.session_key.is_none());
    }

    #[test]
    fn test_session_expiry() {
        let session = AuthSession::new([0u8; 16], [1u8; 16], [2u8; 16], 0);
        assert!(!session.is_expired(100, 300));
        assert!(session.is_expired(1000, 300));
    }
}
