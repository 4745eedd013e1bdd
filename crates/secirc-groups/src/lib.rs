//! # secirc-groups
//!
//! Group pub/sub (§4.9): a `group_id` is owned by exactly one of two
//! mutually exclusive designs, stamped at creation and never switched.
//!
//! - [`decentralized`] — owner-only membership; every post is encrypted
//!   once per recipient and relays never learn who the members are.
//! - [`brokered`] — a broker holds one symmetric group key, wraps it per
//!   member, and fans out a single ciphertext per post.
//! - [`rotation`] — the rotation policy shared by brokered groups: a
//!   scheduled interval plus an immediate rotation on membership change.

pub mod brokered;
pub mod decentralized;
pub mod rotation;

use secirc_types::group::GroupMode;
use secirc_types::Hash16;

/// Errors from group membership and messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("member already in group: {0:?}")]
    MemberExists(Hash16),

    #[error("member not in group: {0:?}")]
    MemberNotFound(Hash16),

    #[error("group is at maximum capacity ({max} members)")]
    GroupFull { max: u32 },

    #[error("only the group owner may perform this operation")]
    NotOwner,

    #[error("a group_id already exists under the other group mode")]
    ModeConflict,

    #[error("no wrapped key for member {0:?}")]
    KeyMissing(Hash16),

    #[error("crypto error: {0}")]
    Crypto(#[from] secirc_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, GroupError>;

/// Enforces mode exclusivity per `group_id` at creation time: a
/// `group_id` already owned by the other design fails with
/// `GroupError::ModeConflict` rather than silently proceeding.
pub fn check_mode_conflict(existing: Option<GroupMode>, requested: GroupMode) -> Result<()> {
    match existing {
        Some(mode) if mode != requested => Err(GroupError::ModeConflict),
        _ => Ok(()),
    }
}
