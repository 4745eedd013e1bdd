//! Owner-only groups: the owner is the single source of membership
//! truth and encrypts every post individually per recipient, so no
//! relay or broker ever learns who the members are.

use std::collections::HashMap;

use secirc_crypto::ecies;
use secirc_crypto::ed25519::{SigningKey, VerifyingKey};
use secirc_crypto::hashing;
use secirc_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use secirc_types::group::{Group, GroupMember, GroupMode, GroupPost, MemberRole};
use secirc_types::{GroupId, Hash16, MessageId};

use crate::{GroupError, Result};

/// Create a new decentralized group with its owner as the sole member.
pub fn create_group(
    group_id: GroupId,
    owner_hash: Hash16,
    owner_pub_key: [u8; 32],
    name: impl Into<String>,
    description: impl Into<String>,
    max_members: u32,
    is_private: bool,
    now: u64,
) -> Group {
    let name = name.into();
    let group_hash = hashing::hash16(&hashing::encode_multi_field(&[
        &group_id,
        &owner_hash,
        name.as_bytes(),
        &now.to_be_bytes(),
    ]));

    let mut members = HashMap::new();
    members.insert(
        owner_hash,
        GroupMember {
            pub_key: owner_pub_key,
            role: MemberRole::Owner,
            joined_ts: now,
        },
    );

    Group {
        group_id,
        group_hash,
        owner_hash,
        name,
        description: description.into(),
        members,
        max_members,
        is_private,
        mode: GroupMode::Decentralized,
        created_ts: now,
    }
}

/// Add a member. Only the owner may call this; `actor` must already be
/// the group's owner.
pub fn add_member(group: &mut Group, actor: &Hash16, member_hash: Hash16, member: GroupMember) -> Result<()> {
    if actor != &group.owner_hash {
        return Err(GroupError::NotOwner);
    }
    if group.members.contains_key(&member_hash) {
        return Err(GroupError::MemberExists(member_hash));
    }
    if group.members.len() as u32 >= group.max_members {
        return Err(GroupError::GroupFull { max: group.max_members });
    }
    group.members.insert(member_hash, member);
    Ok(())
}

/// Remove a member. The owner can never be removed.
pub fn remove_member(group: &mut Group, actor: &Hash16, member_hash: &Hash16) -> Result<()> {
    if actor != &group.owner_hash {
        return Err(GroupError::NotOwner);
    }
    if member_hash == &group.owner_hash {
        return Err(GroupError::NotOwner);
    }
    group
        .members
        .remove(member_hash)
        .map(|_| ())
        .ok_or(GroupError::MemberNotFound(*member_hash))
}

/// Encrypt `plaintext` once per current member under each member's
/// X25519 public key, producing a signed [`GroupPost`].
pub fn publish(
    group: &Group,
    sender_hash: Hash16,
    signing_key: &SigningKey,
    message_id: MessageId,
    plaintext: &[u8],
    member_exchange_keys: &HashMap<Hash16, X25519PublicKey>,
    ts: u64,
    ttl: u64,
) -> Result<GroupPost> {
    if !group.members.contains_key(&sender_hash) {
        return Err(GroupError::MemberNotFound(sender_hash));
    }

    let mut encrypted_for = HashMap::with_capacity(group.members.len());
    for member_hash in group.members.keys() {
        let exchange_key = member_exchange_keys
            .get(member_hash)
            .ok_or(GroupError::KeyMissing(*member_hash))?;
        let ciphertext = ecies::encrypt(exchange_key, plaintext)?;
        encrypted_for.insert(*member_hash, ciphertext.to_bytes());
    }

    let signed_material = hashing::encode_multi_field(&[&message_id, &group.group_id, &sender_hash, &ts.to_be_bytes()]);
    let signature = signing_key.sign(&signed_material).to_bytes();

    Ok(GroupPost {
        message_id,
        group_id: group.group_id,
        sender_hash,
        encrypted_for,
        signature,
        ts,
        ttl,
    })
}

/// Decrypt a post addressed to `recipient_hash`, verifying the sender's
/// signature over the post's binding fields.
pub fn open(
    post: &GroupPost,
    recipient_hash: &Hash16,
    recipient_secret: &X25519StaticSecret,
    sender_verifying_key: &VerifyingKey,
) -> Result<Vec<u8>> {
    let signed_material = hashing::encode_multi_field(&[
        &post.message_id,
        &post.group_id,
        &post.sender_hash,
        &post.ts.to_be_bytes(),
    ]);
    let signature = secirc_crypto::ed25519::Signature::from_bytes(&post.signature);
    sender_verifying_key
        .verify(&signed_material, &signature)
        .map_err(GroupError::Crypto)?;

    let wrapped = post.encrypted_for.get(recipient_hash).ok_or(GroupError::KeyMissing(*recipient_hash))?;
    let ciphertext = ecies::EciesCiphertext::from_bytes(wrapped)?;
    Ok(ecies::decrypt(recipient_secret, &ciphertext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secirc_crypto::ed25519::KeyPair;

    fn exchange_pair() -> (X25519StaticSecret, X25519PublicKey) {
        let secret = X25519StaticSecret::random();
        let public = secret.public_key();
        (secret, public)
    }

    #[test]
    fn test_create_group_owner_is_sole_member() {
        let group = create_group([1u8; 32], [2u8; 16], [0u8; 32], "room", "", 10, true, 100);
        assert_eq!(group.members.len(), 1);
        assert!(group.owner_is_member());
    }

    #[test]
    fn test_non_owner_cannot_add_member() {
        let mut group = create_group([1u8; 32], [2u8; 16], [0u8; 32], "room", "", 10, true, 100);
        let result = add_member(
            &mut group,
            &[9u8; 16],
            [3u8; 16],
            GroupMember { pub_key: [0u8; 32], role: MemberRole::Member, joined_ts: 100 },
        );
        assert!(matches!(result, Err(GroupError::NotOwner)));
    }

    #[test]
    fn test_owner_cannot_be_removed() {
        let mut group = create_group([1u8; 32], [2u8; 16], [0u8; 32], "room", "", 10, true, 100);
        let result = remove_member(&mut group, &[2u8; 16], &[2u8; 16]);
        assert!(matches!(result, Err(GroupError::NotOwner)));
    }

    #[test]
    fn test_group_full_rejects_add() {
        let mut group = create_group([1u8; 32], [2u8; 16], [0u8; 32], "room", "", 1, true, 100);
        let result = add_member(
            &mut group,
            &[2u8; 16],
            [3u8; 16],
            GroupMember { pub_key: [0u8; 32], role: MemberRole::Member, joined_ts: 100 },
        );
        assert!(matches!(result, Err(GroupError::GroupFull { max: 1 })));
    }

    #[test]
    fn test_publish_then_open_round_trip() {
        let owner_kp = KeyPair::generate();
        let mut group = create_group([1u8; 32], [2u8; 16], owner_kp.verifying_key.to_bytes(), "room", "", 10, true, 100);

        let (member_secret, member_pub) = exchange_pair();
        add_member(
            &mut group,
            &[2u8; 16],
            [3u8; 16],
            GroupMember { pub_key: [0u8; 32], role: MemberRole::Member, joined_ts: 100 },
        )
        .unwrap();

        let mut exchange_keys = HashMap::new();
        let (_owner_secret, owner_exchange_pub) = exchange_pair();
        exchange_keys.insert([2u8; 16], owner_exchange_pub);
        exchange_keys.insert([3u8; 16], member_pub);

        let post = publish(
            &group,
            [2u8; 16],
            &owner_kp.signing_key,
            [7u8; 16],
            b"hello group",
            &exchange_keys,
            200,
            3600,
        )
        .unwrap();

        let opened = open(&post, &[3u8; 16], &member_secret, &owner_kp.verifying_key).unwrap();
        assert_eq!(opened, b"hello group");
    }

    #[test]
    fn test_open_rejects_tampered_signature() {
        let owner_kp = KeyPair::generate();
        let mut group = create_group([1u8; 32], [2u8; 16], owner_kp.verifying_key.to_bytes(), "room", "", 10, true, 100);
        let (member_secret, member_pub) = exchange_pair();
        add_member(
            &mut group,
            &[2u8; 16],
            [3u8; 16],
            GroupMember { pub_key: [0u8; 32], role: MemberRole::Member, joined_ts: 100 },
        )
        .unwrap();

        let mut exchange_keys = HashMap::new();
        exchange_keys.insert([2u8; 16], exchange_pair().1);
        exchange_keys.insert([3u8; 16], member_pub);

        let mut post = publish(&group, [2u8; 16], &owner_kp.signing_key, [7u8; 16], b"hello", &exchange_keys, 200, 3600).unwrap();
        post.ts += 1;

        let result = open(&post, &[3u8; 16], &member_secret, &owner_kp.verifying_key);
        assert!(result.is_err());
    }
}
