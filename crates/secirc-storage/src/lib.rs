//! # secirc-storage
//!
//! **[ambient]** The relay core's only persisted state (§6): an
//! identity file wrapping the principal's Ed25519 signing key under an
//! Argon2id-derived key-encryption-key, a contacts file, and a relay
//! cache of last-known announcements. None of this is required for the
//! core's logic to run — it exists so a client/relay process can
//! survive a restart.
//!
//! - [`identity`] — the passphrase-wrapped identity file.
//! - [`contacts`] — a JSON map of known contacts.
//! - [`relay_cache`] — a JSON list of last-known relay announcements.

pub mod contacts;
pub mod identity;
pub mod relay_cache;

/// Errors from persisted-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] secirc_crypto::CryptoError),

    #[error("wrong passphrase or corrupted identity file")]
    WrongPassphrase,
}

pub type Result<T> = std::result::Result<T, StorageError>;
