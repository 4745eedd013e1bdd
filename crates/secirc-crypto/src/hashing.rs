//! Domain-separated SHA-256 hashing and HKDF-SHA256 key derivation.
//!
//! secIRC identities and envelope integrity hashes are defined in terms of
//! plain SHA-256 (`hash16 == SHA256(public_key)[0..16]`,
//! `integrity_hash == SHA256(type_tag || payload || salt || domain)`), so
//! this module wraps `sha2` rather than a keyed hash function. Key
//! derivation (session keys, per-type replay salts) goes through
//! HKDF-SHA256 with a registered context string, the same domain-
//! separation discipline applied with a different primitive.
//!
//! ## Context Strings
//!
//! Every call site that derives a key must pass one of [`contexts`]'
//! constants. An unregistered context string is a protocol violation.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};

/// Registered HKDF context strings used across the secIRC relay core.
pub mod contexts {
    pub const SESSION_KEY: &str = "secirc-v1 session-key";
    pub const ENVELOPE_SALT: &str = "secirc-v1 envelope-salt";
    pub const ECIES_ENCRYPTION_KEY: &str = "secirc-v1 ecies-encryption-key";
    pub const ECIES_NONCE: &str = "secirc-v1 ecies-nonce";
    pub const GROUP_KEY_WRAP: &str = "secirc-v1 group-key-wrap";
    pub const IDENTITY_FILE_KEK: &str = "secirc-v1 identity-file-kek";
    pub const ROTATION_TRANSCRIPT: &str = "secirc-v1 rotation-transcript";

    /// All registered context strings, used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[
        SESSION_KEY,
        ENVELOPE_SALT,
        ECIES_ENCRYPTION_KEY,
        ECIES_NONCE,
        GROUP_KEY_WRAP,
        IDENTITY_FILE_KEK,
        ROTATION_TRANSCRIPT,
    ];
}

/// Compute the SHA-256 digest of the input data.
///
/// Used for identity hashing (`hash16 = sha256(public_key)[0..16]`) and
/// envelope integrity hashes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut result = [0u8; 32];
    result.copy_from_slice(&out);
    result
}

/// Truncate a 32-byte hash to the first 16 bytes, producing a `hash16`
/// identity as defined in the data model.
pub fn hash16(data: &[u8]) -> [u8; 16] {
    let full = sha256(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&full[..16]);
    out
}

/// Derive a 32-byte key via HKDF-SHA256 with a registered context string.
///
/// `context` is used as the HKDF `info` parameter; `key_material` is the
/// input keying material (IKM). No salt is used (HKDF-Extract with a
/// zero-length salt), matching the teacher's single-parameter
/// `derive_key` convention.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, key_material);
    let mut out = [0u8; 32];
    // The only failure mode is an output length that doesn't fit into
    // 255 * hash-len, which 32 bytes from SHA-256 never triggers.
    hk.expand(context.as_bytes(), &mut out)
        .expect("32-byte HKDF-SHA256 expand cannot fail");
    out
}

/// Derive an arbitrary-length key via HKDF-SHA256.
pub fn derive_key_len(context: &str, key_material: &[u8], out: &mut [u8]) {
    let hk = Hkdf::<Sha256>::new(None, key_material);
    hk.expand(context.as_bytes(), out)
        .expect("HKDF-SHA256 expand within RFC 5869 length bound");
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Encode multiple dynamic-length fields for hashing/derivation, using
/// `LE32(len(field)) || field` framing to prevent ambiguous concatenation.
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_deterministic() {
        assert_eq!(sha256(b"secirc test vector 1"), sha256(b"secirc test vector 1"));
    }

    #[test]
    fn test_sha256_different_inputs() {
        assert_ne!(sha256(b"input1"), sha256(b"input2"));
    }

    #[test]
    fn test_hash16_is_prefix_of_sha256() {
        let data = b"hash16 test";
        let full = sha256(data);
        let short = hash16(data);
        assert_eq!(&full[..16], &short[..]);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let k1 = derive_key(contexts::SESSION_KEY, &[0u8; 32]);
        let k2 = derive_key(contexts::SESSION_KEY, &[0u8; 32]);
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_derive_key_different_contexts_diverge() {
        let k1 = derive_key(contexts::SESSION_KEY, &[0u8; 32]);
        let k2 = derive_key(contexts::ECIES_NONCE, &[0u8; 32]);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_is_registered_context() {
        assert!(is_registered_context(contexts::SESSION_KEY));
        assert!(!is_registered_context("made-up-context"));
    }

    #[test]
    fn test_multi_field_encoding() {
        let encoded = encode_multi_field(&[b"hello", b"world"]);
        assert_eq!(encoded.len(), 4 + 5 + 4 + 5);
        assert_eq!(&encoded[0..4], &5u32.to_le_bytes());
        assert_eq!(&encoded[4..9], b"hello");
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("") per FIPS 180-4 test vectors.
        let digest = sha256(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
