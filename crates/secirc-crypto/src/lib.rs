//! # secirc-crypto
//!
//! Cryptographic primitives for the secIRC relay core.
//!
//! The cryptographic suite is fixed: no algorithm negotiation happens on
//! the wire except for the group-key `algorithm` tag, which only selects
//! among the three AEADs in [`aead`].
//!
//! ## Modules
//!
//! - [`hashing`] — Domain-separated SHA-256 hashing and HKDF-SHA256 key derivation
//! - [`ed25519`] — Ed25519 signing and verification (RFC 8032)
//! - [`x25519`] — X25519 key agreement (RFC 7748)
//! - [`chacha20`] — ChaCha20-Poly1305 AEAD encryption (RFC 8439)
//! - [`aead`] — algorithm-selectable AEAD for group keys (AES-256-GCM /
//!   ChaCha20-Poly1305 / XChaCha20-Poly1305)
//! - [`argon2id`] — Argon2id key derivation for identity-at-rest wrapping
//! - [`ecies`] — hybrid X25519 + ChaCha20-Poly1305 encrypt/decrypt

pub mod aead;
pub mod argon2id;
pub mod chacha20;
pub mod ecies;
pub mod ed25519;
pub mod hashing;
pub mod x25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Argon2id hashing failed.
    #[error("argon2id error: {0}")]
    Argon2(String),

    /// ECIES encryption/decryption failed.
    #[error("ECIES error: {0}")]
    Ecies(String),

    /// Unsupported or unknown AEAD algorithm tag.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
