//! Local identity, client authentication, and contacts.

use std::sync::Arc;

use secirc_crypto::ed25519::{KeyPair, SigningKey, VerifyingKey};
use secirc_types::auth::{ChallengeKind, ChallengeResponse};
use secirc_types::Hash16;
use serde_json::Value;
use tracing::info;

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

/// Create a fresh local identity, sealing its signing key under
/// `password` via `secirc-storage`, and unlocks the session.
pub async fn create_identity(state: &Arc<DaemonState>, params: &Value) -> Result {
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("password required"))?;

    let kp = KeyPair::generate();
    let hash16 = secirc_crypto::ed25519::derive_identity_hash(&kp.verifying_key);
    let now = now_secs();

    let file = secirc_storage::identity::IdentityFile::seal(
        hash16,
        kp.verifying_key.to_bytes(),
        secirc_types::identity::IdentityKind::User,
        now,
        &kp.signing_key,
        password.as_bytes(),
    )
    .map_err(|e| RpcError::internal_error(&format!("seal failed: {e}")))?;

    let path = state.data_dir.join("identity.json");
    file.save(&path)
        .map_err(|e| RpcError::internal_error(&format!("save failed: {e}")))?;

    {
        let mut identity = state.identity.write().await;
        *identity = Some(LocalIdentity { hash16, signing_key: kp.signing_key, verifying_key: kp.verifying_key });
    }
    *state.unlocked.write().await = true;

    info!(hash16 = %hex::encode(hash16), "Created local identity");
    Ok(serde_json::json!({"hash16": hex::encode(hash16)}))
}

/// Unlock the identity file on disk with `password`.
pub async fn unlock(state: &Arc<DaemonState>, params: &Value) -> Result {
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("password required"))?;

    let path = state.data_dir.join("identity.json");
    let file = secirc_storage::identity::IdentityFile::load(&path)
        .map_err(|e| RpcError::internal_error(&format!("load failed: {e}")))?;
    let signing_key = file
        .unseal(password.as_bytes())
        .map_err(|_| RpcError::wrong_password())?;
    let verifying_key = signing_key.verifying_key();

    {
        let mut identity = state.identity.write().await;
        *identity = Some(LocalIdentity { hash16: file.hash16, signing_key, verifying_key });
    }
    *state.unlocked.write().await = true;

    Ok(serde_json::json!({"hash16": hex::encode(file.hash16)}))
}

/// Return the local identity's public record, if unlocked.
pub async fn get_my_identity(state: &Arc<DaemonState>) -> Result {
    let identity = state.identity.read().await;
    let identity = identity.as_ref().ok_or_else(RpcError::pik_not_initialized)?;
    Ok(serde_json::json!({
        "hash16": hex::encode(identity.hash16),
        "public_key": hex::encode(identity.verifying_key.to_bytes()),
    }))
}

/// Create a client authentication session and issue a proof-of-work
/// challenge (§4.7).
pub async fn begin_authentication(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_hash = hex_hash16(params, "user_hash")?;
    let server_hash = hex_hash16(params, "server_hash")?;

    let mut session_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut session_id);
    let now = now_secs();

    let mut auth = state.auth.write().await;
    auth.create_session(session_id, user_hash, server_hash, now);

    let mut challenge_blob = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut challenge_blob);
    let challenge = auth
        .issue_challenge(&session_id, ChallengeKind::ProofOfWork, challenge_blob.to_vec(), now)
        .map_err(|e| RpcError::internal_error(&format!("auth error: {e}")))?;

    Ok(serde_json::json!({
        "session_id": hex::encode(session_id),
        "challenge_id": challenge.challenge_id,
        "difficulty": challenge.difficulty,
        "blob": hex::encode(&challenge.blob),
    }))
}

/// Submit a solved proof-of-work nonce for an in-flight session.
pub async fn submit_pow_response(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session_id = hex_hash16(params, "session_id")?;
    let challenge_id = params
        .get("challenge_id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params("challenge_id required"))? as u32;
    let nonce_hex = params
        .get("nonce")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("nonce required"))?;
    let nonce = hex::decode(nonce_hex).map_err(|_| RpcError::invalid_params("nonce is not valid hex"))?;

    let now = now_secs();
    let response = ChallengeResponse { challenge_id, response: nonce, submitted_ts: now };

    let mut auth = state.auth.write().await;
    let outcome = auth
        .submit_response(&session_id, response, now, None)
        .map_err(|e| RpcError::internal_error(&format!("auth error: {e}")))?;

    Ok(serde_json::json!({"outcome": format!("{outcome:?}")}))
}

pub async fn add_contact(state: &Arc<DaemonState>, params: &Value) -> Result {
    let hash16 = hex_hash16(params, "hash16")?;
    let public_key_hex = params
        .get("public_key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("public_key required"))?;
    let public_key: [u8; 32] = hex::decode(public_key_hex)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| RpcError::invalid_params("public_key must be 32 bytes of hex"))?;
    let nickname = params.get("nickname").and_then(|v| v.as_str()).map(str::to_string);

    let verifying_key =
        VerifyingKey::from_bytes(&public_key).map_err(|_| RpcError::invalid_params("public_key is not a valid point"))?;
    if secirc_crypto::ed25519::derive_identity_hash(&verifying_key) != hash16 {
        return Err(RpcError::invalid_params("hash16 does not match SHA256(public_key)[0..16]"));
    }

    let mut contacts = state.contacts.write().await;
    contacts.upsert(secirc_storage::contacts::Contact { hash16, public_key, nickname, last_seen: now_secs() });
    contacts
        .save(&state.data_dir.join("contacts.json"))
        .map_err(|e| RpcError::internal_error(&format!("save failed: {e}")))?;

    Ok(serde_json::json!({"added": true}))
}

pub async fn remove_contact(state: &Arc<DaemonState>, params: &Value) -> Result {
    let hash16 = hex_hash16(params, "hash16")?;
    let mut contacts = state.contacts.write().await;
    contacts.remove(&hash16);
    contacts
        .save(&state.data_dir.join("contacts.json"))
        .map_err(|e| RpcError::internal_error(&format!("save failed: {e}")))?;
    Ok(serde_json::json!({"removed": true}))
}

pub async fn get_contacts(state: &Arc<DaemonState>) -> Result {
    let contacts = state.contacts.read().await;
    Ok(serde_json::json!({"count": contacts.len()}))
}

/// Local identity held in memory while the session is unlocked.
pub struct LocalIdentity {
    pub hash16: Hash16,
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
