//! Integration test: removing a brokered-group member forces a rekey
//! that excludes them, both from the wrap table and from decrypting
//! anything posted afterward.

use std::collections::HashMap;

use secirc_crypto::x25519::X25519StaticSecret;
use secirc_groups::brokered::{decrypt_post, encrypt_post, generate_key, rotate, unwrap_key};
use secirc_groups::rotation::KeyRotationPolicy;
use secirc_types::group::GroupKeyAlgorithm;
use secirc_types::Hash16;

const OWNER: Hash16 = [1u8; 16];
const M1: Hash16 = [2u8; 16];
const M2: Hash16 = [3u8; 16];
const REMOVED: Hash16 = [4u8; 16];

#[test]
fn removed_member_loses_access_after_rotation() {
    let owner_secret = X25519StaticSecret::random();
    let m1_secret = X25519StaticSecret::random();
    let m2_secret = X25519StaticSecret::random();
    let removed_secret = X25519StaticSecret::random();

    let mut members = HashMap::new();
    members.insert(OWNER, owner_secret.public_key());
    members.insert(M1, m1_secret.public_key());
    members.insert(M2, m2_secret.public_key());
    members.insert(REMOVED, removed_secret.public_key());

    let policy = KeyRotationPolicy::default();
    let original = generate_key([0xAA; 32], 1, GroupKeyAlgorithm::ChaCha20Poly1305, &members, 100, &policy).unwrap();
    assert_eq!(original.wrapped_keys.len(), 4);

    // The owner removes REMOVED and rotates the key for the remaining three.
    members.remove(&REMOVED);
    let rotated = rotate(&original, &members, 200, &policy).unwrap();

    assert_eq!(rotated.wrapped_keys.len(), 3);
    assert!(!rotated.wrapped_keys.contains_key(&REMOVED));
    assert_ne!(rotated.key, original.key);

    // The three remaining members can still unwrap the new key.
    assert!(unwrap_key(&rotated, &OWNER, &owner_secret).is_ok());
    assert!(unwrap_key(&rotated, &M1, &m1_secret).is_ok());
    assert!(unwrap_key(&rotated, &M2, &m2_secret).is_ok());

    // The removed member has no wrap at all to even attempt unwrapping.
    assert!(unwrap_key(&rotated, &REMOVED, &removed_secret).is_err());

    // A post made under the new key is opaque to someone still holding
    // only the old key.
    let nonce = [0u8; 12];
    let ciphertext = encrypt_post(&rotated, &nonce, b"you're not invited anymore", b"").unwrap();
    assert!(decrypt_post(&original, &nonce, &ciphertext, b"").is_err());
    assert_eq!(decrypt_post(&rotated, &nonce, &ciphertext, b"").unwrap(), b"you're not invited anymore");
}
