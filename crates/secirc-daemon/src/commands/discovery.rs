//! Relay discovery admission (§4.10): announcement intake, denylist
//! management, and the persisted relay cache.

use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use secirc_discovery::pipeline::LivenessProbe;
use secirc_types::network::RelayAnnouncement;
use secirc_types::Hash16;
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

fn now_secs() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Probes liveness with a short TCP connect — good enough to weed out
/// dead or unreachable candidates before they enter the verification
/// pipeline.
struct TcpLivenessProbe {
    timeout: Duration,
}

impl LivenessProbe for TcpLivenessProbe {
    fn probe(&self, addr: &str, port: u16) -> bool {
        let Ok(ip) = addr.parse() else { return false };
        TcpStream::connect_timeout(&SocketAddr::new(ip, port), self.timeout).is_ok()
    }
}

/// Runs a candidate through the admission pipeline and, on success,
/// caches it for reconnection.
pub async fn submit_announcement(state: &Arc<DaemonState>, params: &Value) -> Result {
    let announcement: RelayAnnouncement = serde_json::from_value(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("invalid announcement: {e}")))?;
    let now = now_secs();
    let probe = TcpLivenessProbe { timeout: Duration::from_millis(1500) };

    let node = {
        let denylist = state.denylist.read().await;
        let mut rate_limiter = state.rate_limiter.write().await;
        secirc_discovery::pipeline::admit(&announcement, &denylist, &mut rate_limiter, &probe, now)
            .map_err(|e| RpcError::internal_error(&format!("discovery error: {e}")))?
    };

    state.relay_cache.write().await.upsert(announcement.clone());

    state.event_bus.emit(Event {
        event_type: "RelayDiscovered".to_string(),
        timestamp: now,
        payload: serde_json::json!({"relay_id": hex::encode(node.hash16), "addr": node.addr}),
    });

    Ok(serde_json::json!({"hash16": hex::encode(node.hash16), "addr": node.addr, "port": node.port}))
}

pub async fn denylist_add(state: &Arc<DaemonState>, params: &Value) -> Result {
    let relay_id = hex_hash16(params, "relay_id")?;
    state.denylist.write().await.add(relay_id);
    Ok(serde_json::json!({"added": true}))
}

pub async fn denylist_remove(state: &Arc<DaemonState>, params: &Value) -> Result {
    let relay_id = hex_hash16(params, "relay_id")?;
    state.denylist.write().await.remove(&relay_id);
    Ok(serde_json::json!({"removed": true}))
}

pub async fn get_relay_cache(state: &Arc<DaemonState>) -> Result {
    let cache = state.relay_cache.read().await;
    let relays: Vec<Value> = cache
        .all()
        .iter()
        .map(|a| serde_json::json!({"relay_id": hex::encode(a.relay_id), "addr": a.addr, "port": a.port}))
        .collect();
    Ok(serde_json::json!({"relays": relays}))
}
