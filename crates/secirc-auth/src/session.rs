//! Session driver: issues challenges and verifies responses, advancing
//! each session's state machine.

use std::collections::HashMap;

use secirc_crypto::ed25519::{Signature, VerifyingKey};
use secirc_crypto::hashing;
use secirc_types::auth::{AuthSession, Challenge, ChallengeKind, ChallengeResponse, SessionStatus};
use secirc_types::{DEFAULT_POW_DIFFICULTY, Hash16, SessionId};

use crate::pow;
use crate::{AuthError, Result};

/// Tunables for the authentication protocol.
#[derive(Clone, Copy, Debug)]
pub struct AuthConfig {
    pub pow_difficulty: u32,
    pub challenge_ttl_secs: u64,
    pub session_ttl_secs: u64,
    pub timestamp_tolerance_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pow_difficulty: DEFAULT_POW_DIFFICULTY,
            challenge_ttl_secs: 300,
            session_ttl_secs: 3600,
            timestamp_tolerance_secs: 30,
        }
    }
}

/// Result of verifying one challenge response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Failed,
    Expired,
}

/// Evidence needed to check a `Signature` challenge; every other
/// challenge kind verifies from the response bytes alone.
pub struct SignatureEvidence<'a> {
    pub verifying_key: &'a VerifyingKey,
}

/// Owns every in-flight authentication session.
#[derive(Default)]
pub struct SessionDriver {
    config: AuthConfig,
    sessions: HashMap<SessionId, AuthSession>,
    next_challenge_id: u32,
}

impl SessionDriver {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            next_challenge_id: 1,
        }
    }

    pub fn create_session(
        &mut self,
        session_id: SessionId,
        user_hash: Hash16,
        server_hash: Hash16,
        now: u64,
    ) {
        self.sessions
            .insert(session_id, AuthSession::new(session_id, user_hash, server_hash, now));
    }

    pub fn session(&self, session_id: &SessionId) -> Result<&AuthSession> {
        self.sessions
            .get(session_id)
            .ok_or(AuthError::NoSuchSession(*session_id))
    }

    /// Issues a challenge of the given kind, attaching `blob` (the
    /// data the candidate must sign, solve, or echo back).
    pub fn issue_challenge(
        &mut self,
        session_id: &SessionId,
        kind: ChallengeKind,
        blob: Vec<u8>,
        now: u64,
    ) -> Result<Challenge> {
        let difficulty = if kind == ChallengeKind::ProofOfWork {
            self.config.pow_difficulty
        } else {
            0
        };
        let challenge_id = self.next_challenge_id;
        self.next_challenge_id += 1;
        let challenge = Challenge {
            challenge_id,
            kind,
            blob,
            issued_ts: now,
            difficulty,
        };
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(AuthError::NoSuchSession(*session_id))?;
        session.challenges.push(challenge.clone());
        session.status = SessionStatus::Challenged;
        session.last_activity = now;
        Ok(challenge)
    }

    /// Verifies a submitted response against the matching outstanding
    /// challenge. `signature_evidence` is required only for
    /// `ChallengeKind::Signature`.
    pub fn submit_response(
        &mut self,
        session_id: &SessionId,
        response: ChallengeResponse,
        now: u64,
        signature_evidence: Option<SignatureEvidence<'_>>,
    ) -> Result<VerifyOutcome> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(AuthError::NoSuchSession(*session_id))?;

        if session.is_expired(now, self.config.session_ttl_secs) {
            session.status = SessionStatus::Expired;
            return Ok(VerifyOutcome::Expired);
        }
        if session.status != SessionStatus::Challenged {
            return Err(AuthError::NotAwaitingResponse(*session_id));
        }

        let challenge = session
            .challenges
            .iter()
            .find(|c| c.challenge_id == response.challenge_id)
            .cloned()
            .ok_or(AuthError::NoSuchChallenge(response.challenge_id))?;

        session.status = SessionStatus::Responded;
        session.last_activity = now;

        if now.saturating_sub(challenge.issued_ts) > self.config.challenge_ttl_secs {
            session.status = SessionStatus::Expired;
            return Ok(VerifyOutcome::Expired);
        }

        let passed = match challenge.kind {
            ChallengeKind::Signature => match signature_evidence {
                Some(evidence) => verify_signature(&challenge, &response, evidence.verifying_key),
                None => false,
            },
            ChallengeKind::ProofOfWork => pow::verify(&challenge.blob, &response.response, challenge.difficulty),
            ChallengeKind::Timestamp => verify_timestamp(&challenge, &response, self.config.timestamp_tolerance_secs),
            ChallengeKind::Nonce => response.response == challenge.blob,
        };

        session.responses.push(response);
        if passed {
            session.status = SessionStatus::Verified;
            session.session_key = Some(mint_session_key(session));
            Ok(VerifyOutcome::Verified)
        } else {
            session.status = SessionStatus::Failed;
            Ok(VerifyOutcome::Failed)
        }
    }
}

fn verify_signature(challenge: &Challenge, response: &ChallengeResponse, key: &VerifyingKey) -> bool {
    let Ok(sig_bytes) = <[u8; 64]>::try_from(response.response.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    key.verify(&challenge.blob, &signature).is_ok()
}

fn verify_timestamp(challenge: &Challenge, response: &ChallengeResponse, tolerance_secs: u64) -> bool {
    let Ok(ts_bytes) = <[u8; 8]>::try_from(response.response.as_slice()) else {
        return false;
    };
    let responded_ts = u64::from_be_bytes(ts_bytes);
    responded_ts.abs_diff(challenge.issued_ts) <= tolerance_secs
}

fn mint_session_key(session: &AuthSession) -> [u8; 32] {
    let material = hashing::encode_multi_field(&[
        &session.session_id,
        &session.user_hash,
        &session.server_hash,
    ]);
    hashing::derive_key(hashing::contexts::SESSION_KEY, &material)
}
