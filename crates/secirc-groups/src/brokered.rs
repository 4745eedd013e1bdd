//! Broker-held groups: one symmetric key per group, wrapped per member
//! via ECIES, fanning a single ciphertext out to every member instead of
//! one per recipient.

use std::collections::HashMap;

use secirc_crypto::aead;
use secirc_crypto::ecies;
use secirc_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use secirc_types::group::{GroupKey, GroupKeyAlgorithm};
use secirc_types::{GroupId, Hash16};

use crate::rotation::KeyRotationPolicy;
use crate::{GroupError, Result};

/// Generate a fresh group key, wrapped for every current member.
pub fn generate_key(
    group_id: GroupId,
    key_id: u64,
    algorithm: GroupKeyAlgorithm,
    members: &HashMap<Hash16, X25519PublicKey>,
    now: u64,
    policy: &KeyRotationPolicy,
) -> Result<GroupKey> {
    let mut key = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut key);

    let mut wrapped_keys = HashMap::with_capacity(members.len());
    for (member, exchange_pk) in members {
        wrapped_keys.insert(*member, wrap_key(&key, exchange_pk)?);
    }

    Ok(GroupKey {
        group_id,
        key_id,
        algorithm,
        key,
        wrapped_keys,
        created_ts: now,
        expires_ts: now + policy.interval_secs,
        version: 1,
    })
}

/// Wrap a group key's plaintext for a single member's exchange key.
fn wrap_key(key: &[u8; 32], exchange_pk: &X25519PublicKey) -> Result<Vec<u8>> {
    let ciphertext = ecies::encrypt(exchange_pk, key)?;
    Ok(ciphertext.to_bytes())
}

/// Unwrap a member's copy of the group key.
pub fn unwrap_key(group_key: &GroupKey, member: &Hash16, member_secret: &X25519StaticSecret) -> Result<[u8; 32]> {
    let wrapped = group_key
        .wrapped_keys
        .get(member)
        .ok_or(GroupError::KeyMissing(*member))?;
    let ciphertext = ecies::EciesCiphertext::from_bytes(wrapped)?;
    let plaintext = ecies::decrypt(member_secret, &ciphertext)?;
    let mut key = [0u8; 32];
    if plaintext.len() != 32 {
        return Err(GroupError::KeyMissing(*member));
    }
    key.copy_from_slice(&plaintext);
    Ok(key)
}

/// Add a member to a live group key by wrapping a copy for them,
/// without touching the plaintext key itself.
pub fn wrap_for_new_member(group_key: &mut GroupKey, member: Hash16, exchange_pk: &X25519PublicKey) -> Result<()> {
    let wrapped = wrap_key(&group_key.key, exchange_pk)?;
    group_key.wrapped_keys.insert(member, wrapped);
    Ok(())
}

/// Rotate to a brand-new key, wrapped for exactly the members passed in
/// (a just-removed member is simply omitted by the caller).
pub fn rotate(
    old: &GroupKey,
    members: &HashMap<Hash16, X25519PublicKey>,
    now: u64,
    policy: &KeyRotationPolicy,
) -> Result<GroupKey> {
    let mut next = generate_key(old.group_id, old.key_id + 1, old.algorithm, members, now, policy)?;
    next.version = old.version + 1;
    Ok(next)
}

/// Encrypt a post under the group's current key.
pub fn encrypt_post(group_key: &GroupKey, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let algorithm = to_aead_algorithm(group_key.algorithm);
    Ok(aead::encrypt(algorithm, &group_key.key, nonce, plaintext, aad)?)
}

/// Decrypt a post under the group's current key.
pub fn decrypt_post(group_key: &GroupKey, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let algorithm = to_aead_algorithm(group_key.algorithm);
    Ok(aead::decrypt(algorithm, &group_key.key, nonce, ciphertext, aad)?)
}

fn to_aead_algorithm(algorithm: GroupKeyAlgorithm) -> aead::Algorithm {
    match algorithm {
        GroupKeyAlgorithm::Aes256Gcm => aead::Algorithm::Aes256Gcm,
        GroupKeyAlgorithm::ChaCha20Poly1305 => aead::Algorithm::ChaCha20Poly1305,
        GroupKeyAlgorithm::XChaCha20Poly1305 => aead::Algorithm::XChaCha20Poly1305,
    }
}
