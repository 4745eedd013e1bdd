//! The identity file: a principal's hash/public-key record plus its
//! Ed25519 signing key, wrapped at rest under an Argon2id-derived KEK
//! (matching `secirc_crypto::argon2id`'s identity-file parameters).

use std::path::Path;

use secirc_crypto::argon2id;
use secirc_crypto::chacha20;
use secirc_crypto::ed25519::SigningKey;
use secirc_types::identity::IdentityKind;
use secirc_types::Hash16;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Result, StorageError};

/// On-disk representation: salt/nonce/ciphertext hex-encoded alongside
/// the plaintext identity metadata.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityFile {
    pub hash16: Hash16,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub public_key: Vec<u8>,
    pub kind: IdentityKind,
    pub created_at: u64,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub kek_salt: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub nonce: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub wrapped_signing_key: Vec<u8>,
}

impl IdentityFile {
    /// Wrap a signing key under a passphrase-derived KEK.
    pub fn seal(
        hash16: Hash16,
        public_key: [u8; 32],
        kind: IdentityKind,
        created_at: u64,
        signing_key: &SigningKey,
        passphrase: &[u8],
    ) -> Result<Self> {
        let kek_salt = argon2id::generate_salt();
        let kek = argon2id::derive_identity_kek(passphrase, &kek_salt)?;

        let mut nonce = [0u8; chacha20::NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut nonce);

        let wrapped_signing_key = chacha20::encrypt(&kek, &nonce, &signing_key.to_bytes(), &hash16)?;

        Ok(Self {
            hash16,
            public_key: public_key.to_vec(),
            kind,
            created_at,
            kek_salt: kek_salt.to_vec(),
            nonce: nonce.to_vec(),
            wrapped_signing_key,
        })
    }

    /// Unwrap the signing key with the given passphrase.
    pub fn unseal(&self, passphrase: &[u8]) -> Result<SigningKey> {
        let kek = argon2id::derive_identity_kek(passphrase, &self.kek_salt)?;
        let nonce: [u8; chacha20::NONCE_SIZE] =
            self.nonce.as_slice().try_into().map_err(|_| StorageError::WrongPassphrase)?;
        let plaintext = chacha20::decrypt(&kek, &nonce, &self.wrapped_signing_key, &self.hash16)
            .map_err(|_| StorageError::WrongPassphrase)?;
        let bytes: [u8; 32] = plaintext.as_slice().try_into().map_err(|_| StorageError::WrongPassphrase)?;
        Ok(SigningKey::from_bytes(&bytes))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secirc_crypto::ed25519::KeyPair;

    #[test]
    fn test_seal_then_unseal_round_trip() {
        let kp = KeyPair::generate();
        let file = IdentityFile::seal(
            [1u8; 16],
            kp.verifying_key.to_bytes(),
            IdentityKind::User,
            100,
            &kp.signing_key,
            b"correct horse battery staple",
        )
        .unwrap();

        let recovered = file.unseal(b"correct horse battery staple").unwrap();
        assert_eq!(recovered.to_bytes(), kp.signing_key.to_bytes());
    }

    #[test]
    fn test_wrong_passphrase_rejected() {
        let kp = KeyPair::generate();
        let file = IdentityFile::seal([1u8; 16], kp.verifying_key.to_bytes(), IdentityKind::User, 100, &kp.signing_key, b"right passphrase").unwrap();
        assert!(file.unseal(b"wrong passphrase").is_err());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let kp = KeyPair::generate();
        let file = IdentityFile::seal([2u8; 16], kp.verifying_key.to_bytes(), IdentityKind::Relay, 100, &kp.signing_key, b"passphrase").unwrap();

        let path = std::env::temp_dir().join(format!("secirc-identity-test-{}.json", std::process::id()));
        file.save(&path).unwrap();
        let loaded = IdentityFile::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.hash16, file.hash16);
        let recovered = loaded.unseal(b"passphrase").unwrap();
        assert_eq!(recovered.to_bytes(), kp.signing_key.to_bytes());
    }
}
