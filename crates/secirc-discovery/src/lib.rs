//! # secirc-discovery
//!
//! Discovery (§4.10) produces relay candidates for the verification
//! pipeline from four source methods — DHT, tracker, peer-exchange, and
//! bootstrap seed nodes. The wire-level mechanics of each source (DHT
//! routing, tracker protocols, DNS) are out of scope for the relay
//! core; this crate only requires that a candidate arrive as a signed
//! [`secirc_types::network::RelayAnnouncement`] and puts every
//! candidate, regardless of source, through the same pipeline:
//! rate-limit by source address, sanity-check the address/port/key,
//! check the denylist, verify the signature, and probe liveness.
//!
//! - [`sources`] — the four discovery methods and bootstrap seed config.
//! - [`denylist`] — confirmed-malicious `relay_id`s that short-circuit
//!   future appearances.
//! - [`pipeline`] — the admission pipeline every candidate passes through.

pub mod denylist;
pub mod pipeline;
pub mod sources;

use secirc_types::Hash16;

/// Errors from discovery admission.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid port: {0}")]
    InvalidPort(u16),

    #[error("relay {0:?} is denylisted")]
    Denylisted(Hash16),

    #[error("signature invalid for relay {0:?}")]
    SignatureInvalid(Hash16),

    #[error("announced relay_id {0:?} does not match SHA256(public_key)[0..16]")]
    IdentityMismatch(Hash16),

    #[error("liveness probe failed for relay {0:?}")]
    LivenessFailed(Hash16),

    #[error("crypto error: {0}")]
    Crypto(#[from] secirc_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
