//! Online presence and store-and-forward delivery (§4.8).

use std::sync::Arc;

use secirc_types::presence::{PendingMessage, PresenceStatus};
use secirc_types::{Hash16, MessageType};
use serde_json::Value;

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn hex_hash16(params: &Value, field: &str) -> std::result::Result<Hash16, RpcError> {
    let s = params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    let bytes = hex::decode(s).map_err(|_| RpcError::invalid_params(&format!("{field} is not valid hex")))?;
    Hash16::try_from(bytes.as_slice()).map_err(|_| RpcError::invalid_params(&format!("{field} must be 16 bytes")))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Drains `recipient`'s offline queue and actually attempts delivery
/// over the transport layer for each message: a successful send is
/// dropped from the queue, a failed one goes through
/// [`secirc_presence::DeliveryManager::record_delivery_failure`] so it
/// gets retried (or dropped once attempts are exhausted) like any
/// other failed send.
pub(crate) async fn attempt_redelivery(state: &Arc<DaemonState>, recipient: &Hash16) -> Vec<PendingMessage> {
    let pending = state.delivery.write().await.deliver_pending(recipient);
    let mut delivered = Vec::with_capacity(pending.len());
    for message in pending {
        match state.transport.send(recipient, &message.ciphertext).await {
            secirc_transport::SendOutcome::Ok => delivered.push(message),
            _ => state.delivery.write().await.record_delivery_failure(recipient, message),
        }
    }
    delivered
}

/// Marks the caller online and redelivers anything queued while it
/// was away.
pub async fn mark_online(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = hex_hash16(params, "user")?;
    let server = hex_hash16(params, "server")?;
    let mut session = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut session);
    let pk_hex = params
        .get("public_key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("public_key required"))?;
    let pk: [u8; 32] = hex::decode(pk_hex)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| RpcError::invalid_params("public_key must be 32 bytes of hex"))?;
    let nickname = params.get("nickname").and_then(|v| v.as_str()).unwrap_or_default();
    let now = now_secs();

    {
        let mut presence = state.presence.write().await;
        presence.mark_online(user, server, session, pk, nickname, now);
    }

    let redelivered = attempt_redelivery(state, &user).await;
    state.event_bus.emit(Event {
        event_type: "UserOnline".to_string(),
        timestamp: now,
        payload: serde_json::json!({"user": hex::encode(user)}),
    });

    Ok(serde_json::json!({
        "redelivered": redelivered.iter().map(pending_message_json).collect::<Vec<_>>(),
    }))
}

pub async fn mark_offline(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = hex_hash16(params, "user")?;
    state
        .presence
        .write()
        .await
        .mark_offline(&user)
        .map_err(|e| RpcError::internal_error(&format!("presence error: {e}")))?;
    state.event_bus.emit(Event {
        event_type: "UserOffline".to_string(),
        timestamp: now_secs(),
        payload: serde_json::json!({"user": hex::encode(user)}),
    });
    Ok(serde_json::json!({"offline": true}))
}

pub async fn set_status(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = hex_hash16(params, "user")?;
    let status = match params.get("status").and_then(|v| v.as_str()) {
        Some("online") => PresenceStatus::Online,
        Some("away") => PresenceStatus::Away,
        Some("busy") => PresenceStatus::Busy,
        Some("invisible") => PresenceStatus::Invisible,
        Some("offline") => PresenceStatus::Offline,
        _ => return Err(RpcError::invalid_params("status must be one of online|away|busy|invisible|offline")),
    };
    state
        .presence
        .write()
        .await
        .set_status(&user, status, now_secs())
        .map_err(|e| RpcError::internal_error(&format!("presence error: {e}")))?;
    Ok(serde_json::json!({"updated": true}))
}

pub async fn get_presence(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = hex_hash16(params, "user")?;
    let presence = state.presence.read().await;
    match presence.get(&user) {
        Some(p) => Ok(serde_json::json!({
            "user": hex::encode(p.user),
            "status": format!("{:?}", p.status).to_lowercase(),
            "last_seen": p.last_seen,
            "nickname": p.nickname,
        })),
        None => Err(RpcError::invalid_params("no presence record for that user")),
    }
}

/// Enqueues a ciphertext for an offline recipient (§4.8).
pub async fn queue_message(state: &Arc<DaemonState>, params: &Value) -> Result {
    let sender_hash = hex_hash16(params, "sender")?;
    let recipient_hash = hex_hash16(params, "recipient")?;
    let ciphertext_hex = params
        .get("ciphertext")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("ciphertext required"))?;
    let ciphertext = hex::decode(ciphertext_hex).map_err(|_| RpcError::invalid_params("ciphertext is not valid hex"))?;
    let ttl = params.get("ttl").and_then(|v| v.as_u64()).unwrap_or(604_800);
    let max_attempts = params.get("max_attempts").and_then(|v| v.as_u64()).unwrap_or(5) as u32;

    let mut message_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut message_id);

    state.delivery.write().await.queue_message(PendingMessage {
        message_id,
        sender_hash,
        recipient_hash,
        message_type: MessageType::Datagram,
        ciphertext,
        ttl,
        attempts: 0,
        max_attempts,
        status: secirc_types::presence::DeliveryStatus::Pending,
        enqueued_ts: now_secs(),
    });

    Ok(serde_json::json!({"message_id": hex::encode(message_id)}))
}

pub async fn pending_count(state: &Arc<DaemonState>, params: &Value) -> Result {
    let recipient = hex_hash16(params, "recipient")?;
    let count = state.delivery.read().await.pending_count(&recipient);
    Ok(serde_json::json!({"pending": count}))
}

fn pending_message_json(message: &PendingMessage) -> Value {
    serde_json::json!({
        "message_id": hex::encode(message.message_id),
        "sender": hex::encode(message.sender_hash),
        "ciphertext": hex::encode(&message.ciphertext),
    })
}
