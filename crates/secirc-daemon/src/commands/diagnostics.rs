//! Diagnostics, session lock, and event subscription.

use std::sync::Arc;

use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Get daemon logs (buffered entries would come from the tracing
/// subscriber's in-memory layer; v1 returns an empty page).
pub async fn get_daemon_logs(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _level = params.get("level").and_then(|v| v.as_str()).unwrap_or("info");
    Ok(serde_json::json!([]))
}

/// Export a diagnostics bundle: ring health, member count, and relay
/// cache size, for support tickets.
pub async fn export_diagnostics(state: &Arc<DaemonState>) -> Result {
    let ring = state.ring.read().await;
    let relay_cache_len = state.relay_cache.read().await.len();
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "ring_status": ring.as_ref().map(|r| format!("{:?}", r.status)),
        "ring_member_count": ring.as_ref().map(|r| r.member_count()).unwrap_or(0),
        "relay_cache_len": relay_cache_len,
    }))
}

/// Network-level summary: ring health plus how many relays are
/// currently known.
pub async fn get_network_stats(state: &Arc<DaemonState>) -> Result {
    let ring = state.ring.read().await;
    let relay_count = state.relay_cache.read().await.len();
    let denylist_count = state.denylist.read().await.len();
    Ok(serde_json::json!({
        "ring_member_count": ring.as_ref().map(|r| r.member_count()).unwrap_or(0),
        "ring_status": ring.as_ref().map(|r| format!("{:?}", r.status)),
        "known_relays": relay_count,
        "denylisted_relays": denylist_count,
    }))
}

/// Lock the current session, discarding the in-memory signing key.
pub async fn lock_session(state: &Arc<DaemonState>) -> Result {
    *state.identity.write().await = None;
    *state.unlocked.write().await = false;
    Ok(serde_json::json!({"locked": true}))
}

/// Subscribe to the daemon event bus; the caller polls the returned
/// subscription id via the RPC connection's out-of-band push channel.
pub async fn subscribe_events(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _filter = params.get("filter");
    let mut sub_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut sub_id);
    Ok(serde_json::json!({"subscription_id": hex::encode(sub_id)}))
}

pub async fn unsubscribe_events(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _subscription_id = params
        .get("subscription_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("subscription_id required"))?;
    Ok(serde_json::json!({"unsubscribed": true}))
}
