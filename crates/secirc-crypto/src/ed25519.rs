//! Ed25519 signing and verification (RFC 8032).
//!
//! Ed25519 is the only asymmetric signature algorithm secIRC uses. It
//! signs envelopes, ring-join challenges, key-rotation phase messages, and
//! client authentication challenges. There is no HMAC-based signature
//! fallback anywhere in this workspace — every `_sign_message` path in the
//! original source's placeholder HMAC scheme is replaced by a real
//! signature here.
//!
//! This module wraps `ed25519-dalek` with secIRC-specific types.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// An Ed25519 signing key (private key).
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&self.inner.to_bytes()),
        }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// An Ed25519 keypair: the long-term identity key for a user, relay, or
/// first-ring member.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a signing key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signing key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }
}

impl VerifyingKey {
    /// Create a verifying key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Get the raw bytes of this verifying key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate();
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create a keypair from a signing key's raw bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }
}

/// Derive a 16-byte identity hash from a public key.
///
/// `hash16 = SHA256(public_key)[0..16]`, the identity-binding invariant
/// shared by users, groups, and relays.
pub fn derive_identity_hash(public_key: &VerifyingKey) -> [u8; 16] {
    crate::hashing::hash16(public_key.as_bytes())
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A relay signs its announcement (relay_id, address, capacity); a
    /// peer verifies it against the relay's published verifying key.
    #[test]
    fn relay_announcement_verifies_under_its_own_key() {
        let relay = KeyPair::generate();
        let announcement = b"relay-announce|addr=203.0.113.9:4433|capacity=512";
        let sig = relay.signing_key.sign(announcement);
        assert!(relay.verifying_key.verify(announcement, &sig).is_ok());
    }

    /// A ring-join challenge response must verify under the joining
    /// member's key, not under an arbitrary first-ring member's key.
    #[test]
    fn ring_join_challenge_response_rejects_the_wrong_signer() {
        let joining_member = KeyPair::generate();
        let unrelated_ring_member = KeyPair::generate();
        let challenge = b"ring-join-challenge|nonce=8f2c";
        let response = joining_member.signing_key.sign(challenge);
        assert!(unrelated_ring_member
            .verifying_key
            .verify(challenge, &response)
            .is_err());
    }

    /// Key-rotation phase messages (propose/commit) are tied to a
    /// specific rotation round; a signature from one round must not
    /// verify against another round's message bytes.
    #[test]
    fn key_rotation_phase_message_is_bound_to_its_round() {
        let kp = KeyPair::generate();
        let propose_round_3 = b"rotation-propose|round=3";
        let sig = kp.signing_key.sign(propose_round_3);
        let propose_round_4 = b"rotation-propose|round=4";
        assert!(kp.verifying_key.verify(propose_round_4, &sig).is_err());
    }

    /// Client auth challenges are one-shot: a signature over a given
    /// nonce only verifies against that exact nonce.
    #[test]
    fn client_auth_challenge_signature_does_not_transfer_to_a_different_nonce() {
        let client = KeyPair::generate();
        let nonce_a = b"auth-challenge|nonce=aa11";
        let nonce_b = b"auth-challenge|nonce=bb22";
        let sig = client.signing_key.sign(nonce_a);
        assert!(client.verifying_key.verify(nonce_b, &sig).is_err());
    }

    #[test]
    fn signing_key_roundtrips_through_raw_bytes() {
        let kp = KeyPair::generate();
        let secret_bytes = kp.signing_key.to_bytes();
        let restored = KeyPair::from_bytes(&secret_bytes);
        assert_eq!(kp.verifying_key.to_bytes(), restored.verifying_key.to_bytes());
    }

    #[test]
    fn signature_roundtrips_through_wire_bytes() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"envelope-header|from=ab12|to=cd34");
        let bytes = sig.to_bytes();
        let restored = Signature::from_bytes(&bytes);
        assert_eq!(sig, restored);
    }

    #[test]
    fn verifying_key_roundtrips_through_wire_bytes() {
        let kp = KeyPair::generate();
        let bytes = kp.verifying_key.to_bytes();
        let restored = VerifyingKey::from_bytes(&bytes).expect("valid key");
        assert_eq!(kp.verifying_key, restored);
    }

    /// The identity-binding invariant: `hash16` is a pure, deterministic
    /// function of the public key, and two distinct keys must not
    /// collide onto the same `hash16` in practice.
    #[test]
    fn identity_hash_is_deterministic_and_key_specific() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();

        let hash_a = derive_identity_hash(&a.verifying_key);
        let hash_a_again = derive_identity_hash(&a.verifying_key);
        assert_eq!(hash_a, hash_a_again);
        assert_eq!(hash_a, crate::hashing::hash16(a.verifying_key.as_bytes()));

        let hash_b = derive_identity_hash(&b.verifying_key);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn same_seed_yields_the_same_identity_every_time() {
        let seed = [42u8; 32];
        let kp1 = KeyPair::from_bytes(&seed);
        let kp2 = KeyPair::from_bytes(&seed);
        assert_eq!(kp1.verifying_key.to_bytes(), kp2.verifying_key.to_bytes());
        assert_eq!(
            derive_identity_hash(&kp1.verifying_key),
            derive_identity_hash(&kp2.verifying_key)
        );

        let kp3 = KeyPair::from_bytes(&[43u8; 32]);
        assert_ne!(kp1.verifying_key.to_bytes(), kp3.verifying_key.to_bytes());
    }

    #[test]
    fn known_test_vector_seed_signs_and_verifies() {
        // RFC 8032 §7.1 test vector 1's seed.
        let seed = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
            .expect("valid hex");
        let mut seed_bytes = [0u8; 32];
        seed_bytes.copy_from_slice(&seed);
        let kp = KeyPair::from_bytes(&seed_bytes);

        assert_ne!(kp.verifying_key.to_bytes(), [0u8; 32]);

        let empty_sig = kp.signing_key.sign(b"");
        assert!(kp.verifying_key.verify(b"", &empty_sig).is_ok());

        let sig = kp.signing_key.sign(b"envelope-header|from=ab12|to=cd34");
        assert!(kp
            .verifying_key
            .verify(b"envelope-header|from=ab12|to=cd34", &sig)
            .is_ok());
    }
}
