//! # secirc-auth
//!
//! Client challenge-response authentication (§4.7): four challenge
//! families (signature, proof-of-work, timestamp, nonce) driving a
//! session through `Pending -> Challenged -> Responded -> {Verified,
//! Failed, Expired}`.

pub mod pow;
pub mod session;

pub use session::{AuthConfig, SessionDriver, VerifyOutcome};

use secirc_types::SessionId;

/// Errors from the authentication protocol.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session with id {0:?}")]
    NoSuchSession(SessionId),
    #[error("session {0:?} is not awaiting a response")]
    NotAwaitingResponse(SessionId),
    #[error("challenge {0} not found in this session")]
    NoSuchChallenge(u32),
}

pub type Result<T> = std::result::Result<T, AuthError>;
