//! The admission pipeline every discovered candidate passes through,
//! regardless of which of the four methods surfaced it: rate-limit,
//! sanity-check, denylist, signature, liveness — only then does a
//! candidate become a [`RelayNode`] for the verification pipeline.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;

use secirc_crypto::ed25519::{Signature, VerifyingKey};
use secirc_crypto::hashing;
use secirc_types::network::{RelayAnnouncement, RelayNode};

use crate::denylist::Denylist;
use crate::{DiscoveryError, Result};

pub const MIN_RELAY_PORT: u16 = 1024;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_MAX: usize = 20;

/// Per-source-address sliding-window rate limiter.
pub struct RateLimiter {
    window_secs: u64,
    max_per_window: usize,
    seen: HashMap<String, VecDeque<u64>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_WINDOW_SECS, DEFAULT_RATE_LIMIT_MAX)
    }
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_per_window: usize) -> Self {
        Self { window_secs, max_per_window, seen: HashMap::new() }
    }

    /// Records a hit from `addr` at `now`, returning whether it is
    /// still within the rate limit.
    pub fn check(&mut self, addr: &str, now: u64) -> bool {
        let hits = self.seen.entry(addr.to_string()).or_default();
        while let Some(&oldest) = hits.front() {
            if now.saturating_sub(oldest) > self.window_secs {
                hits.pop_front();
            } else {
                break;
            }
        }
        if hits.len() >= self.max_per_window {
            return false;
        }
        hits.push_back(now);
        true
    }
}

/// Checks whether an address is a plausible public relay endpoint:
/// parses as an IP and is not private, loopback, or multicast.
pub fn validate_address(addr: &str) -> bool {
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => !(ip.is_private() || ip.is_loopback() || ip.is_multicast() || ip.is_unspecified()),
        Ok(IpAddr::V6(ip)) => !(ip.is_loopback() || ip.is_multicast() || ip.is_unspecified()),
        Err(_) => false,
    }
}

pub fn validate_port(port: u16) -> bool {
    port >= MIN_RELAY_PORT
}

/// Capability trait for checking that a candidate relay actually
/// answers, injected so tests can substitute a stub.
pub trait LivenessProbe {
    fn probe(&self, addr: &str, port: u16) -> bool;
}

fn announcement_signed_material(ann: &RelayAnnouncement) -> Vec<u8> {
    hashing::encode_multi_field(&[
        &ann.relay_id,
        &ann.public_key,
        ann.addr.as_bytes(),
        &ann.port.to_be_bytes(),
        &ann.last_seen.to_be_bytes(),
    ])
}

/// Runs one candidate through rate-limit, sanity, denylist, signature,
/// and liveness checks, returning the [`RelayNode`] to register on
/// success.
pub fn admit(
    announcement: &RelayAnnouncement,
    denylist: &Denylist,
    rate_limiter: &mut RateLimiter,
    liveness: &dyn LivenessProbe,
    now: u64,
) -> Result<RelayNode> {
    if denylist.is_denied(&announcement.relay_id) {
        return Err(DiscoveryError::Denylisted(announcement.relay_id));
    }
    if !rate_limiter.check(&announcement.addr, now) {
        return Err(DiscoveryError::RateLimited(announcement.addr.clone()));
    }
    if !validate_address(&announcement.addr) {
        return Err(DiscoveryError::InvalidAddress(announcement.addr.clone()));
    }
    if !validate_port(announcement.port) {
        return Err(DiscoveryError::InvalidPort(announcement.port));
    }

    let verifying_key = VerifyingKey::from_bytes(&announcement.public_key)?;
    let signature = Signature::from_bytes(&announcement.sig);
    verifying_key
        .verify(&announcement_signed_material(announcement), &signature)
        .map_err(|_| DiscoveryError::SignatureInvalid(announcement.relay_id))?;

    if secirc_crypto::ed25519::derive_identity_hash(&verifying_key) != announcement.relay_id {
        return Err(DiscoveryError::IdentityMismatch(announcement.relay_id));
    }

    if !liveness.probe(&announcement.addr, announcement.port) {
        return Err(DiscoveryError::LivenessFailed(announcement.relay_id));
    }

    Ok(RelayNode::new(
        announcement.relay_id,
        announcement.public_key,
        announcement.addr.clone(),
        announcement.port,
        now,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secirc_crypto::ed25519::KeyPair;

    struct AlwaysAlive;
    impl LivenessProbe for AlwaysAlive {
        fn probe(&self, _addr: &str, _port: u16) -> bool {
            true
        }
    }

    struct NeverAlive;
    impl LivenessProbe for NeverAlive {
        fn probe(&self, _addr: &str, _port: u16) -> bool {
            false
        }
    }

    fn signed_announcement(kp: &KeyPair, addr: &str, port: u16, relay_id: [u8; 16]) -> RelayAnnouncement {
        let mut ann = RelayAnnouncement {
            relay_id,
            public_key: kp.verifying_key.to_bytes(),
            addr: addr.to_string(),
            port,
            services: vec![],
            capabilities: vec![],
            uptime_secs: 0,
            last_seen: 1000,
            version: "1".into(),
            sig: [0u8; 64],
        };
        ann.sig = kp.signing_key.sign(&announcement_signed_material(&ann)).to_bytes();
        ann
    }

    #[test]
    fn test_rejects_private_address() {
        assert!(!validate_address("192.168.1.1"));
        assert!(!validate_address("127.0.0.1"));
        assert!(validate_address("203.0.113.7"));
    }

    #[test]
    fn test_rejects_low_port() {
        assert!(!validate_port(80));
        assert!(validate_port(9000));
    }

    #[test]
    fn test_rate_limiter_blocks_after_max() {
        let mut limiter = RateLimiter::new(60, 2);
        assert!(limiter.check("203.0.113.7", 0));
        assert!(limiter.check("203.0.113.7", 1));
        assert!(!limiter.check("203.0.113.7", 2));
    }

    #[test]
    fn test_rate_limiter_window_expires() {
        let mut limiter = RateLimiter::new(10, 1);
        assert!(limiter.check("203.0.113.7", 0));
        assert!(!limiter.check("203.0.113.7", 5));
        assert!(limiter.check("203.0.113.7", 15));
    }

    #[test]
    fn test_admit_full_pipeline_success() {
        let kp = KeyPair::generate();
        let relay_id = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
        let ann = signed_announcement(&kp, "203.0.113.7", 9000, relay_id);
        let denylist = Denylist::new();
        let mut limiter = RateLimiter::default();
        let node = admit(&ann, &denylist, &mut limiter, &AlwaysAlive, 1000).unwrap();
        assert_eq!(node.hash16, relay_id);
    }

    #[test]
    fn test_admit_rejects_denylisted() {
        let kp = KeyPair::generate();
        let relay_id = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
        let ann = signed_announcement(&kp, "203.0.113.7", 9000, relay_id);
        let mut denylist = Denylist::new();
        denylist.add(relay_id);
        let mut limiter = RateLimiter::default();
        let result = admit(&ann, &denylist, &mut limiter, &AlwaysAlive, 1000);
        assert!(matches!(result, Err(DiscoveryError::Denylisted(_))));
    }

    #[test]
    fn test_admit_rejects_tampered_signature() {
        let kp = KeyPair::generate();
        let relay_id = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
        let mut ann = signed_announcement(&kp, "203.0.113.7", 9000, relay_id);
        ann.port = 9001;
        let denylist = Denylist::new();
        let mut limiter = RateLimiter::default();
        let result = admit(&ann, &denylist, &mut limiter, &AlwaysAlive, 1000);
        assert!(matches!(result, Err(DiscoveryError::SignatureInvalid(_))));
    }

    #[test]
    fn test_admit_rejects_dead_liveness() {
        let kp = KeyPair::generate();
        let relay_id = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
        let ann = signed_announcement(&kp, "203.0.113.7", 9000, relay_id);
        let denylist = Denylist::new();
        let mut limiter = RateLimiter::default();
        let result = admit(&ann, &denylist, &mut limiter, &NeverAlive, 1000);
        assert!(matches!(result, Err(DiscoveryError::LivenessFailed(_))));
    }

    /// A relay whose announced `relay_id` doesn't match its own signing
    /// key -- e.g. replaying another relay's `relay_id` with a fresh
    /// keypair -- is rejected even though the signature itself is valid.
    #[test]
    fn test_admit_rejects_relay_id_not_bound_to_signing_key() {
        let kp = KeyPair::generate();
        let ann = signed_announcement(&kp, "203.0.113.7", 9000, [0x77u8; 16]);
        let denylist = Denylist::new();
        let mut limiter = RateLimiter::default();
        let result = admit(&ann, &denylist, &mut limiter, &AlwaysAlive, 1000);
        assert!(matches!(result, Err(DiscoveryError::IdentityMismatch(_))));
    }
}
