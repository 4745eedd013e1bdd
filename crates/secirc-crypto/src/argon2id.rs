//! Argon2id password-based key derivation.
//!
//! secIRC's identity file wraps a principal's Ed25519 signing key at rest
//! under a key-encryption-key derived from the user's passphrase with
//! Argon2id. There is no proof-of-work here: client registration
//! proof-of-work is a plain SHA-256 leading-zero-bit puzzle (see
//! `secirc-auth`), not an Argon2id one — Argon2id is reserved for the
//! passphrase path, where its memory-hardness actually matters.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::{CryptoError, Result};

/// Default Argon2id parameters for identity-file KEK derivation:
/// m=256MB, t=3 iterations, p=4 parallelism lanes.
pub const IDENTITY_KEK_M_COST: u32 = 262144; // 256 * 1024 KiB
pub const IDENTITY_KEK_T_COST: u32 = 3;
pub const IDENTITY_KEK_P_COST: u32 = 4;
pub const IDENTITY_KEK_OUTPUT_LEN: usize = 32;

/// Derive the identity file's key-encryption-key from a passphrase.
///
/// # Arguments
///
/// * `passphrase` - the user's passphrase
/// * `salt` - random 16-byte salt, stored alongside the wrapped identity file
pub fn derive_identity_kek(passphrase: &[u8], salt: &[u8]) -> Result<[u8; IDENTITY_KEK_OUTPUT_LEN]> {
    let params = Params::new(
        IDENTITY_KEK_M_COST,
        IDENTITY_KEK_T_COST,
        IDENTITY_KEK_P_COST,
        Some(IDENTITY_KEK_OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; IDENTITY_KEK_OUTPUT_LEN];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    Ok(output)
}

/// Derive a key with custom Argon2id parameters, for callers that need
/// parameters other than the identity-file default (e.g. lower-cost
/// derivations in tests).
pub fn derive_key_custom(
    passphrase: &[u8],
    salt: &[u8],
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
    output_len: usize,
) -> Result<Vec<u8>> {
    let params = Params::new(m_cost, t_cost, p_cost, Some(output_len))
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = vec![0u8; output_len];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;

    Ok(output)
}

/// Generate a random 16-byte salt for Argon2id.
pub fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_custom_deterministic() {
        let passphrase = b"test passphrase";
        let salt = b"1234567890123456"; // 16 bytes

        // Small parameters for test speed.
        let key1 = derive_key_custom(passphrase, salt, 1024, 1, 1, 32).expect("derive");
        let key2 = derive_key_custom(passphrase, salt, 1024, 1, 1, 32).expect("derive");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_passphrases() {
        let salt = b"1234567890123456";
        let key1 = derive_key_custom(b"pass1", salt, 1024, 1, 1, 32).expect("derive");
        let key2 = derive_key_custom(b"pass2", salt, 1024, 1, 1, 32).expect("derive");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_derive_key_different_salts() {
        let passphrase = b"passphrase";
        let key1 =
            derive_key_custom(passphrase, b"salt111111111111", 1024, 1, 1, 32).expect("derive");
        let key2 =
            derive_key_custom(passphrase, b"salt222222222222", 1024, 1, 1, 32).expect("derive");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();
        assert_ne!(salt1, salt2);
        assert_eq!(salt1.len(), 16);
    }

    #[test]
    fn test_identity_kek_roundtrip_deterministic() {
        let passphrase = b"correct horse battery staple";
        let salt = generate_salt();
        let kek1 = derive_identity_kek(passphrase, &salt).expect("derive");
        let kek2 = derive_identity_kek(passphrase, &salt).expect("derive");
        assert_eq!(kek1, kek2);
    }
}
