//! Group and group-key records for both pub/sub designs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{GroupId, Hash16, MessageId};

/// Which of the two group designs owns a `group_id`. Stamped at creation
/// time; a group never switches designs, and a creation request for an
/// existing `group_id` under the other mode fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// Owner-only membership; the owner encrypts each post once per
    /// member and relays never learn membership.
    Decentralized,
    /// A broker holds a group key, wraps it per member, and fans out a
    /// single ciphertext per post.
    Brokered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Moderator,
    Member,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMember {
    pub pub_key: [u8; 32],
    pub role: MemberRole,
    pub joined_ts: u64,
}

/// A decentralized (owner-only) group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub group_id: GroupId,
    pub group_hash: Hash16,
    pub owner_hash: Hash16,
    pub name: String,
    pub description: String,
    pub members: HashMap<Hash16, GroupMember>,
    pub max_members: u32,
    pub is_private: bool,
    pub mode: GroupMode,
    pub created_ts: u64,
}

impl Group {
    /// Membership excluding the owner cannot remove the owner — this
    /// just asserts the invariant, it does not enforce it; callers must
    /// reject an owner-removal request before calling into storage.
    pub fn owner_is_member(&self) -> bool {
        self.members.contains_key(&self.owner_hash)
    }
}

/// AEAD algorithm tag for a group key, shared with `secirc-crypto::aead`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKeyAlgorithm {
    Aes256Gcm,
    ChaCha20Poly1305,
    XChaCha20Poly1305,
}

/// A brokered group's key record: the broker holds the plaintext key and
/// a per-member wrapped copy, never the plaintext of any post.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupKey {
    pub group_id: GroupId,
    pub key_id: u64,
    pub algorithm: GroupKeyAlgorithm,
    #[serde_as(as = "serde_with::Bytes")]
    pub key: [u8; 32],
    pub wrapped_keys: HashMap<Hash16, Vec<u8>>,
    pub created_ts: u64,
    pub expires_ts: u64,
    pub version: u32,
}

impl GroupKey {
    /// Drop a removed member's wrapped copy — called on rotation after a
    /// membership change excludes them from the next wrapping set.
    pub fn revoke_member(&mut self, member: &Hash16) {
        self.wrapped_keys.remove(member);
    }
}

/// A decentralized-group post: one ciphertext per recipient, signed by
/// the owner.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupPost {
    pub message_id: MessageId,
    pub group_id: GroupId,
    pub sender_hash: Hash16,
    pub encrypted_for: HashMap<Hash16, Vec<u8>>,
    #[serde_as(as = "serde_with::Bytes")]
    pub signature: [u8; 64],
    pub ts: u64,
    pub ttl: u64,
}

/// Lifecycle/observability events emitted by the groups crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupEvent {
    MessagePublished { group_id: GroupId, message_id: MessageId },
    MessageDelivered { group_id: GroupId, message_id: MessageId, member: Hash16 },
    MessageFailed { group_id: GroupId, message_id: MessageId, member: Hash16 },
    GroupJoined { group_id: GroupId, member: Hash16 },
    GroupLeft { group_id: GroupId, member: Hash16 },
    KeyRotated { group_id: GroupId, key_id: u64, version: u32 },
    MessageCleaned { group_id: GroupId, message_id: MessageId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_member_removes_wrapped_key() {
        let mut key = GroupKey {
            group_id: [0u8; 32],
            key_id: 1,
            algorithm: GroupKeyAlgorithm::ChaCha20Poly1305,
            key: [0u8; 32],
            wrapped_keys: HashMap::from([([1u8; 16], vec![1, 2, 3])]),
            created_ts: 0,
            expires_ts: 100,
            version: 1,
        };
        key.revoke_member(&[1u8; 16]);
        assert!(key.wrapped_keys.is_empty());
    }

    #[test]
    fn test_owner_is_member() {
        let mut members = HashMap::new();
        members.insert(
            [9u8; 16],
            GroupMember {
                pub_key: [0u8; 32],
                role: MemberRole::Owner,
                joined_ts: 0,
            },
        );
        let group = Group {
            group_id: [0u8; 32],
            group_hash: [0u8; 16],
            owner_hash: [9u8; 16],
            name: "test".into(),
            description: String::new(),
            members,
            max_members: 10,
            is_private: false,
            mode: GroupMode::Decentralized,
            created_ts: 0,
        };
        assert!(group.owner_is_member());
    }
}
