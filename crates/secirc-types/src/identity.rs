//! The identity registry (§4.2): `hash16 → Identity`, the single
//! source of truth for public keys used by the verifier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::Hash16;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("hash16 {hash16:?} does not match SHA256(public_key)[0..16]")]
    IdentityMismatch { hash16: Hash16 },

    #[error("no identity registered for {0:?}")]
    Unknown(Hash16),
}

pub type Result<T> = std::result::Result<T, IdentityError>;

/// What kind of principal an identity hash names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    User,
    Group,
    Relay,
}

/// An entry in the identity registry: `hash16 → public key`, refreshed on
/// every interaction and evicted after a configurable idle period.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub hash16: Hash16,
    #[serde_as(as = "serde_with::Bytes")]
    pub public_key: [u8; 32],
    pub kind: IdentityKind,
    pub created_at: u64,
    pub last_seen: u64,
}

impl Identity {
    /// Build a fresh registry entry, stamping `created_at` and
    /// `last_seen` to `now`. Does not verify the `hash16`/`public_key`
    /// binding — callers go through the registry's `register` contract
    /// for that.
    pub fn new(hash16: Hash16, public_key: [u8; 32], kind: IdentityKind, now: u64) -> Self {
        Self {
            hash16,
            public_key,
            kind,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self, now: u64) {
        self.last_seen = now;
    }

    pub fn is_idle(&self, now: u64, max_age_secs: u64) -> bool {
        now.saturating_sub(self.last_seen) > max_age_secs
    }
}

/// Maps `hash16 → Identity`. The single source of truth for public keys
/// used by the verifier — every other component that needs to check a
/// `hash16`/`public_key` binding goes through `register` instead of
/// constructing an [`Identity`] directly.
#[derive(Default)]
pub struct IdentityRegistry {
    identities: HashMap<Hash16, Identity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hash16` → `public_key`, verifying
    /// `hash16 == SHA256(public_key)[0..16]` first. Idempotent: calling
    /// this again for an already-registered, correctly-bound identity
    /// just refreshes `last_seen` rather than erroring.
    pub fn register(&mut self, hash16: Hash16, public_key: [u8; 32], kind: IdentityKind, now: u64) -> Result<()> {
        let verifying_key = secirc_crypto::ed25519::VerifyingKey::from_bytes(&public_key)
            .map_err(|_| IdentityError::IdentityMismatch { hash16 })?;
        if secirc_crypto::ed25519::derive_identity_hash(&verifying_key) != hash16 {
            return Err(IdentityError::IdentityMismatch { hash16 });
        }
        match self.identities.get_mut(&hash16) {
            Some(existing) => existing.touch(now),
            None => {
                self.identities.insert(hash16, Identity::new(hash16, public_key, kind, now));
            }
        }
        Ok(())
    }

    pub fn touch(&mut self, hash16: &Hash16, now: u64) -> Result<()> {
        self.identities
            .get_mut(hash16)
            .map(|identity| identity.touch(now))
            .ok_or(IdentityError::Unknown(*hash16))
    }

    pub fn get(&self, hash16: &Hash16) -> Option<&Identity> {
        self.identities.get(hash16)
    }

    /// Removes every identity idle for longer than `max_age_secs`,
    /// returning the evicted hashes.
    pub fn cleanup(&mut self, now: u64, max_age_secs: u64) -> Vec<Hash16> {
        let idle: Vec<Hash16> = self
            .identities
            .iter()
            .filter(|(_, identity)| identity.is_idle(now, max_age_secs))
            .map(|(hash16, _)| *hash16)
            .collect();
        for hash16 in &idle {
            self.identities.remove(hash16);
        }
        idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secirc_crypto::ed25519::KeyPair;

    #[test]
    fn test_touch_updates_last_seen() {
        let mut identity = Identity::new([1u8; 16], [2u8; 32], IdentityKind::User, 100);
        identity.touch(200);
        assert_eq!(identity.last_seen, 200);
        assert_eq!(identity.created_at, 100);
    }

    #[test]
    fn test_is_idle() {
        let identity = Identity::new([1u8; 16], [2u8; 32], IdentityKind::Relay, 0);
        assert!(!identity.is_idle(100, 300));
        assert!(identity.is_idle(400, 300));
    }

    #[test]
    fn test_register_rejects_mismatched_binding() {
        let kp = KeyPair::generate();
        let mut registry = IdentityRegistry::new();
        let wrong_hash16 = [0xFFu8; 16];
        let result = registry.register(wrong_hash16, kp.verifying_key.to_bytes(), IdentityKind::User, 100);
        assert!(matches!(result, Err(IdentityError::IdentityMismatch { .. })));
        assert!(registry.get(&wrong_hash16).is_none());
    }

    #[test]
    fn test_register_accepts_correct_binding_and_is_idempotent() {
        let kp = KeyPair::generate();
        let hash16 = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
        let mut registry = IdentityRegistry::new();

        registry.register(hash16, kp.verifying_key.to_bytes(), IdentityKind::User, 100).unwrap();
        assert_eq!(registry.get(&hash16).unwrap().last_seen, 100);

        // Re-registering the same, correctly-bound identity just refreshes it.
        registry.register(hash16, kp.verifying_key.to_bytes(), IdentityKind::User, 200).unwrap();
        assert_eq!(registry.get(&hash16).unwrap().created_at, 100);
        assert_eq!(registry.get(&hash16).unwrap().last_seen, 200);
    }

    #[test]
    fn test_cleanup_evicts_idle_entries_only() {
        let mut registry = IdentityRegistry::new();
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let hash1 = secirc_crypto::ed25519::derive_identity_hash(&kp1.verifying_key);
        let hash2 = secirc_crypto::ed25519::derive_identity_hash(&kp2.verifying_key);

        registry.register(hash1, kp1.verifying_key.to_bytes(), IdentityKind::User, 0).unwrap();
        registry.register(hash2, kp2.verifying_key.to_bytes(), IdentityKind::User, 900).unwrap();

        let evicted = registry.cleanup(1000, 300);
        assert_eq!(evicted, vec![hash1]);
        assert!(registry.get(&hash1).is_none());
        assert!(registry.get(&hash2).is_some());
    }

    #[test]
    fn test_touch_unknown_identity_errors() {
        let mut registry = IdentityRegistry::new();
        assert!(matches!(registry.touch(&[9u8; 16], 100), Err(IdentityError::Unknown(_))));
    }
}
