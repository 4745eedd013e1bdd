//! First-ring bootstrap, join/propose/vote, and heartbeat (§4.5),
//! folding in each member's trust score (§4.6).

use std::sync::Arc;

use secirc_ring::membership::{FirstRing, JoinOutcome};
use secirc_trust::scoring;
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

/// Bootstraps a brand-new first ring with the local node as its sole,
/// self-leading member. Only valid once per daemon lifetime — returns
/// an error if a ring is already active.
pub async fn bootstrap(state: &Arc<DaemonState>, params: &Value) -> Result {
    let self_id = hex_hash16(params, "self_id")?;
    let now = now_secs();

    let mut ring_guard = state.ring.write().await;
    if ring_guard.is_some() {
        return Err(RpcError::invalid_params("ring already bootstrapped"));
    }
    *ring_guard = Some(FirstRing::bootstrap(self_id, now));
    drop(ring_guard);

    let mut scores = state.trust_scores.write().await;
    scores.insert(self_id, scoring::first_ring_initial_score(now));

    Ok(serde_json::json!({"bootstrapped": true}))
}

/// Step 2 of the join handshake.
pub async fn request_join(state: &Arc<DaemonState>, params: &Value) -> Result {
    let candidate = hex_hash16(params, "candidate")?;
    let challenge_id = params.get("challenge_id").and_then(|v| v.as_str()).unwrap_or("join");

    let ring = state.ring.read().await;
    let ring = ring.as_ref().ok_or_else(|| RpcError::invalid_params("no ring yet"))?;
    match ring.request_join(candidate, challenge_id) {
        JoinOutcome::Accepted(members) => Ok(serde_json::json!({
            "accepted": true,
            "members": members.iter().map(hex::encode).collect::<Vec<_>>(),
        })),
        JoinOutcome::ChallengeRequired { challenge_id } => Ok(serde_json::json!({
            "accepted": false,
            "challenge_id": challenge_id,
        })),
    }
}

/// Step 4: opens a consensus proposal for a candidate whose join
/// challenge has already been verified (via `secirc-auth`).
pub async fn open_proposal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let proposal_id = params.get("proposal_id").and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params("proposal_id required"))?;
    let candidate = hex_hash16(params, "candidate")?;
    let proposer = hex_hash16(params, "proposer")?;
    let now = now_secs();

    let mut ring = state.ring.write().await;
    let ring = ring.as_mut().ok_or_else(|| RpcError::invalid_params("no ring yet"))?;
    ring.open_proposal(proposal_id, candidate, proposer, now).map_err(|e| RpcError::internal_error(&format!("ring error: {e}")))?;

    Ok(serde_json::json!({"opened": true}))
}

/// Step 5: casts a member's vote, admitting the candidate once quorum
/// is reached.
pub async fn cast_vote(state: &Arc<DaemonState>, params: &Value) -> Result {
    let proposal_id = params.get("proposal_id").and_then(|v| v.as_str()).ok_or_else(|| RpcError::invalid_params("proposal_id required"))?;
    let voter = hex_hash16(params, "voter")?;
    let vote = params.get("vote").and_then(|v| v.as_bool()).ok_or_else(|| RpcError::invalid_params("vote required"))?;
    let now = now_secs();

    let outcome = {
        let mut ring = state.ring.write().await;
        let ring = ring.as_mut().ok_or_else(|| RpcError::invalid_params("no ring yet"))?;
        ring.cast_vote(proposal_id, voter, vote, now).map_err(|e| RpcError::internal_error(&format!("ring error: {e}")))?
    };

    if format!("{outcome:?}") == "Accepted" {
        let candidate = hex_hash16(params, "candidate")?;
        state.trust_scores.write().await.insert(candidate, scoring::first_ring_initial_score(now));
        state.event_bus.emit(Event {
            event_type: "MemberJoined".to_string(),
            timestamp: now,
            payload: serde_json::json!({"member": hex::encode(candidate)}),
        });
    }

    Ok(serde_json::json!({"outcome": format!("{outcome:?}")}))
}

pub async fn record_heartbeat(state: &Arc<DaemonState>, params: &Value) -> Result {
    let member = hex_hash16(params, "member")?;
    let now = now_secs();
    let mut ring = state.ring.write().await;
    let ring = ring.as_mut().ok_or_else(|| RpcError::invalid_params("no ring yet"))?;
    ring.record_heartbeat(&member, now).map_err(|e| RpcError::internal_error(&format!("ring error: {e}")))?;
    Ok(serde_json::json!({"recorded": true}))
}

pub async fn status(state: &Arc<DaemonState>) -> Result {
    let ring = state.ring.read().await;
    match ring.as_ref() {
        Some(ring) => Ok(serde_json::json!({
            "status": format!("{:?}", ring.status),
            "leader": hex::encode(ring.leader),
            "member_count": ring.member_count(),
        })),
        None => Err(RpcError::invalid_params("no ring yet")),
    }
}

/// Returns a member's trust score and band.
pub async fn get_trust_score(state: &Arc<DaemonState>, params: &Value) -> Result {
    let member = hex_hash16(params, "member")?;
    let scores = state.trust_scores.read().await;
    let score = scores.get(&member).ok_or_else(|| RpcError::invalid_params("no trust score for that member"))?;
    let band = scoring::band(score, 0.3, 0.7);
    Ok(serde_json::json!({
        "overall": score.overall,
        "reputation": score.reputation,
        "behavior": score.behavior,
        "consensus": score.consensus,
        "recency": score.recency,
        "band": format!("{band:?}"),
    }))
}
