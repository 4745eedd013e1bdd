//! Group pub/sub (§4.9): decentralized owner-only groups and brokered
//! broker-held groups, mutually exclusive per `group_id`.

use std::collections::HashMap;
use std::sync::Arc;

use secirc_crypto::ed25519::VerifyingKey;
use secirc_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use secirc_groups::rotation::KeyRotationPolicy;
use secirc_types::group::{GroupKeyAlgorithm, GroupMember, GroupMode, GroupPost, MemberRole};
use secirc_types::{GroupId, Hash16};
use serde_json::Value;

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn hex_hash16(params: &Value, field: &str) -> std::result::Result<Hash16, RpcError> {
    let s = params.get(field).and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    let bytes = hex::decode(s).map_err(|_| RpcError::invalid_params(&format!("{field} is not valid hex")))?;
    Hash16::try_from(bytes.as_slice()).map_err(|_| RpcError::invalid_params(&format!("{field} must be 16 bytes")))
}

fn hex_group_id(params: &Value, field: &str) -> std::result::Result<GroupId, RpcError> {
    let s = params.get(field).and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    let bytes = hex::decode(s).map_err(|_| RpcError::invalid_params(&format!("{field} is not valid hex")))?;
    GroupId::try_from(bytes.as_slice()).map_err(|_| RpcError::invalid_params(&format!("{field} must be 32 bytes")))
}

fn hex_pubkey32(params: &Value, field: &str) -> std::result::Result<[u8; 32], RpcError> {
    let s = params.get(field).and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    hex::decode(s).ok().and_then(|b| b.try_into().ok()).ok_or_else(|| RpcError::invalid_params(&format!("{field} must be 32 bytes of hex")))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Creates either group design, stamping `group_id` to whichever mode
/// is requested. Fails if the id is already owned by the other mode.
pub async fn create_group(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    let owner_hash = hex_hash16(params, "owner_hash")?;
    let owner_pub_key = hex_pubkey32(params, "owner_pub_key")?;
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or_default();
    let description = params.get("description").and_then(|v| v.as_str()).unwrap_or_default();
    let max_members = params.get("max_members").and_then(|v| v.as_u64()).unwrap_or(256) as u32;
    let is_private = params.get("is_private").and_then(|v| v.as_bool()).unwrap_or(false);
    let mode = params.get("mode").and_then(|v| v.as_str()).unwrap_or("decentralized");
    let now = now_secs();

    let requested_mode = match mode {
        "decentralized" => GroupMode::Decentralized,
        "brokered" => GroupMode::Brokered,
        other => return Err(RpcError::invalid_params(&format!("unknown group mode: {other}"))),
    };
    let existing_mode = if state.decentralized_groups.read().await.contains_key(&group_id) {
        Some(GroupMode::Decentralized)
    } else if state.brokered_keys.read().await.contains_key(&group_id) {
        Some(GroupMode::Brokered)
    } else {
        None
    };
    secirc_groups::check_mode_conflict(existing_mode, requested_mode)
        .map_err(|e| RpcError::invalid_params(&format!("{e}")))?;

    match requested_mode {
        GroupMode::Decentralized => {
            let group = secirc_groups::decentralized::create_group(
                group_id, owner_hash, owner_pub_key, name, description, max_members, is_private, now,
            );
            state.decentralized_groups.write().await.insert(group_id, group);
        }
        GroupMode::Brokered => {
            let owner_exchange_pk_bytes = hex_pubkey32(params, "owner_exchange_pk")?;
            let owner_exchange_pk = X25519PublicKey::from_bytes(owner_exchange_pk_bytes);
            let mut members = HashMap::new();
            members.insert(owner_hash, owner_exchange_pk);
            let policy = KeyRotationPolicy::new(state.config.groups.key_rotation_interval_secs);
            let key = secirc_groups::brokered::generate_key(group_id, 1, GroupKeyAlgorithm::ChaCha20Poly1305, &members, now, &policy)
                .map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;
            state.brokered_keys.write().await.insert(group_id, key);
        }
    }

    state.event_bus.emit(Event {
        event_type: "GroupCreated".to_string(),
        timestamp: now,
        payload: serde_json::json!({"group_id": hex::encode(group_id), "mode": mode}),
    });
    Ok(serde_json::json!({"group_id": hex::encode(group_id)}))
}

/// Adds a member to a decentralized group. The owner alone may call
/// this.
pub async fn add_member(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    let actor = hex_hash16(params, "actor")?;
    let member_hash = hex_hash16(params, "member_hash")?;
    let member_pub_key = hex_pubkey32(params, "member_pub_key")?;
    let now = now_secs();

    let mut groups = state.decentralized_groups.write().await;
    let group = groups.get_mut(&group_id).ok_or_else(|| RpcError::invalid_params("no such group"))?;
    secirc_groups::decentralized::add_member(
        group, &actor, member_hash, GroupMember { pub_key: member_pub_key, role: MemberRole::Member, joined_ts: now },
    )
    .map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;

    Ok(serde_json::json!({"added": true}))
}

/// Removes a member from a decentralized group.
pub async fn remove_member(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    let actor = hex_hash16(params, "actor")?;
    let member_hash = hex_hash16(params, "member_hash")?;

    let mut groups = state.decentralized_groups.write().await;
    let group = groups.get_mut(&group_id).ok_or_else(|| RpcError::invalid_params("no such group"))?;
    secirc_groups::decentralized::remove_member(group, &actor, &member_hash)
        .map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;

    state.event_bus.emit(Event {
        event_type: "GroupMemberRemoved".to_string(),
        timestamp: now_secs(),
        payload: serde_json::json!({"group_id": hex::encode(group_id), "member": hex::encode(member_hash)}),
    });
    Ok(serde_json::json!({"removed": true}))
}

/// Publishes a post into a decentralized group, encrypting once per
/// current member. `exchange_keys` maps each member's hash16 to their
/// X25519 exchange public key, both hex-encoded.
pub async fn publish(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    let sender_hash = hex_hash16(params, "sender_hash")?;
    let plaintext = hex::decode(params.get("plaintext").and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params("plaintext required"))?)
        .map_err(|_| RpcError::invalid_params("plaintext is not valid hex"))?;
    let signing_key_bytes = hex_pubkey32(params, "signing_key")?;
    let signing_key = secirc_crypto::ed25519::SigningKey::from_bytes(&signing_key_bytes);
    let ttl = params.get("ttl").and_then(|v| v.as_u64()).unwrap_or(86_400);

    let exchange_keys_obj = params.get("exchange_keys").and_then(|v| v.as_object()).ok_or_else(|| RpcError::invalid_params("exchange_keys required"))?;
    let mut member_exchange_keys = HashMap::with_capacity(exchange_keys_obj.len());
    for (hash_hex, pk_value) in exchange_keys_obj {
        let hash_bytes = hex::decode(hash_hex).map_err(|_| RpcError::invalid_params("exchange_keys key is not valid hex"))?;
        let hash: Hash16 = Hash16::try_from(hash_bytes.as_slice()).map_err(|_| RpcError::invalid_params("exchange_keys key must be 16 bytes"))?;
        let pk_bytes: [u8; 32] = pk_value.as_str().and_then(|s| hex::decode(s).ok()).and_then(|b| b.try_into().ok()).ok_or_else(|| RpcError::invalid_params("exchange_keys value must be 32 bytes of hex"))?;
        member_exchange_keys.insert(hash, X25519PublicKey::from_bytes(pk_bytes));
    }

    let mut message_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut message_id);
    let now = now_secs();

    let groups = state.decentralized_groups.read().await;
    let group = groups.get(&group_id).ok_or_else(|| RpcError::invalid_params("no such group"))?;
    let post = secirc_groups::decentralized::publish(group, sender_hash, &signing_key, message_id, &plaintext, &member_exchange_keys, now, ttl)
        .map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;

    Ok(serde_json::to_value(&post).unwrap_or(Value::Null))
}

/// Opens a decentralized post addressed to `recipient_hash`.
pub async fn open(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let recipient_hash = hex_hash16(params, "recipient_hash")?;
    let recipient_secret_bytes = hex_pubkey32(params, "recipient_secret")?;
    let recipient_secret = X25519StaticSecret::from_bytes(recipient_secret_bytes);
    let sender_key_bytes = hex_pubkey32(params, "sender_pub_key")?;
    let sender_verifying_key = VerifyingKey::from_bytes(&sender_key_bytes).map_err(|e| RpcError::invalid_params(&format!("sender_pub_key: {e}")))?;
    let post: GroupPost = serde_json::from_value(params.get("post").cloned().unwrap_or(Value::Null))
        .map_err(|_| RpcError::invalid_params("post must be a valid group post object"))?;

    let plaintext = secirc_groups::decentralized::open(&post, &recipient_hash, &recipient_secret, &sender_verifying_key)
        .map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;

    Ok(serde_json::json!({"plaintext": hex::encode(plaintext)}))
}

/// Rotates a brokered group's key, wrapping it for exactly the members
/// passed in `exchange_keys` (a removed member is simply omitted).
pub async fn rotate_key(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    let exchange_keys_obj = params.get("exchange_keys").and_then(|v| v.as_object()).ok_or_else(|| RpcError::invalid_params("exchange_keys required"))?;
    let mut members = HashMap::with_capacity(exchange_keys_obj.len());
    for (hash_hex, pk_value) in exchange_keys_obj {
        let hash_bytes = hex::decode(hash_hex).map_err(|_| RpcError::invalid_params("exchange_keys key is not valid hex"))?;
        let hash: Hash16 = Hash16::try_from(hash_bytes.as_slice()).map_err(|_| RpcError::invalid_params("exchange_keys key must be 16 bytes"))?;
        let pk_bytes: [u8; 32] = pk_value.as_str().and_then(|s| hex::decode(s).ok()).and_then(|b| b.try_into().ok()).ok_or_else(|| RpcError::invalid_params("exchange_keys value must be 32 bytes of hex"))?;
        members.insert(hash, X25519PublicKey::from_bytes(pk_bytes));
    }

    let now = now_secs();
    let policy = KeyRotationPolicy::new(state.config.groups.key_rotation_interval_secs);
    let mut keys = state.brokered_keys.write().await;
    let old = keys.get(&group_id).ok_or_else(|| RpcError::invalid_params("no such group"))?;
    let next = secirc_groups::brokered::rotate(old, &members, now, &policy).map_err(|e| RpcError::internal_error(&format!("group error: {e}")))?;
    keys.insert(group_id, next);

    state.event_bus.emit(Event {
        event_type: "GroupKeyRotated".to_string(),
        timestamp: now,
        payload: serde_json::json!({"group_id": hex::encode(group_id)}),
    });
    Ok(serde_json::json!({"rotated": true}))
}

pub async fn get_group(state: &Arc<DaemonState>, params: &Value) -> Result {
    let group_id = hex_group_id(params, "group_id")?;
    if let Some(group) = state.decentralized_groups.read().await.get(&group_id) {
        return Ok(serde_json::json!({
            "mode": "decentralized",
            "owner_hash": hex::encode(group.owner_hash),
            "name": group.name,
            "member_count": group.members.len(),
        }));
    }
    if let Some(key) = state.brokered_keys.read().await.get(&group_id) {
        return Ok(serde_json::json!({
            "mode": "brokered",
            "key_id": key.key_id,
            "version": key.version,
            "member_count": key.wrapped_keys.len(),
        }));
    }
    Err(RpcError::invalid_params("no such group"))
}
