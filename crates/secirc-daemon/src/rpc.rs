//! JSON-RPC server over a Unix domain socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC success or error response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) }
    }
}

impl RpcError {
    // Standard JSON-RPC errors.

    pub fn parse_error() -> Self {
        Self { code: -32700, message: "PARSE_ERROR".to_string(), data: None }
    }

    pub fn invalid_request() -> Self {
        Self { code: -32600, message: "INVALID_REQUEST".to_string(), data: None }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self { code: -32601, message: "METHOD_NOT_FOUND".to_string(), data: Some(serde_json::json!({"method": method})) }
    }

    pub fn invalid_params(detail: &str) -> Self {
        Self { code: -32602, message: "INVALID_PARAMS".to_string(), data: Some(serde_json::json!({"detail": detail})) }
    }

    pub fn internal_error(detail: &str) -> Self {
        Self { code: -32603, message: "INTERNAL_ERROR".to_string(), data: Some(serde_json::json!({"detail": detail})) }
    }

    /// Session locked (-32010): the local identity has not been
    /// unlocked for this process yet.
    pub fn session_locked() -> Self {
        Self { code: -32010, message: "SESSION_LOCKED".to_string(), data: None }
    }

    /// Wrong passphrase (-32011) unsealing the identity file.
    pub fn wrong_password() -> Self {
        Self { code: -32011, message: "WRONG_PASSWORD".to_string(), data: None }
    }

    /// No local identity exists yet (-32013).
    pub fn pik_not_initialized() -> Self {
        Self { code: -32013, message: "IDENTITY_NOT_INITIALIZED".to_string(), data: None }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(state: Arc<DaemonState>, stream: tokio::net::UnixStream) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.jsonrpc != "2.0" => RpcResponse::error(request.id, RpcError::invalid_request()),
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Methods reachable before an identity has been created or unlocked.
const UNLOCKED_EXEMPT: &[&str] = &["create_identity", "unlock", "begin_authentication", "submit_pow_response"];
/// Diagnostic/session methods that stay reachable while locked.
const LOCK_EXEMPT: &[&str] = &["get_daemon_logs", "export_diagnostics", "lock_session"];

async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    if !UNLOCKED_EXEMPT.contains(&method) {
        let unlocked = *state.unlocked.read().await;
        if !unlocked && !LOCK_EXEMPT.contains(&method) {
            return RpcResponse::error(id, RpcError::session_locked());
        }
    }

    let result = match method {
        // Identity, contacts, client authentication.
        "create_identity" => commands::identity::create_identity(&state, &request.params).await,
        "unlock" => commands::identity::unlock(&state, &request.params).await,
        "get_my_identity" => commands::identity::get_my_identity(&state).await,
        "begin_authentication" => commands::identity::begin_authentication(&state, &request.params).await,
        "submit_pow_response" => commands::identity::submit_pow_response(&state, &request.params).await,
        "add_contact" => commands::identity::add_contact(&state, &request.params).await,
        "remove_contact" => commands::identity::remove_contact(&state, &request.params).await,
        "get_contacts" => commands::identity::get_contacts(&state).await,

        // First-ring membership and trust.
        "ring_bootstrap" => commands::ring::bootstrap(&state, &request.params).await,
        "ring_request_join" => commands::ring::request_join(&state, &request.params).await,
        "ring_open_proposal" => commands::ring::open_proposal(&state, &request.params).await,
        "ring_cast_vote" => commands::ring::cast_vote(&state, &request.params).await,
        "ring_record_heartbeat" => commands::ring::record_heartbeat(&state, &request.params).await,
        "ring_status" => commands::ring::status(&state).await,
        "get_trust_score" => commands::ring::get_trust_score(&state, &request.params).await,

        // Presence and store-and-forward delivery.
        "mark_online" => commands::presence::mark_online(&state, &request.params).await,
        "mark_offline" => commands::presence::mark_offline(&state, &request.params).await,
        "set_status" => commands::presence::set_status(&state, &request.params).await,
        "get_presence" => commands::presence::get_presence(&state, &request.params).await,
        "queue_message" => commands::presence::queue_message(&state, &request.params).await,
        "pending_count" => commands::presence::pending_count(&state, &request.params).await,

        // Group pub/sub, both designs.
        "create_group" => commands::groups::create_group(&state, &request.params).await,
        "add_member" => commands::groups::add_member(&state, &request.params).await,
        "remove_member" => commands::groups::remove_member(&state, &request.params).await,
        "publish" => commands::groups::publish(&state, &request.params).await,
        "open" => commands::groups::open(&state, &request.params).await,
        "rotate_key" => commands::groups::rotate_key(&state, &request.params).await,
        "get_group" => commands::groups::get_group(&state, &request.params).await,

        // Relay discovery admission.
        "submit_announcement" => commands::discovery::submit_announcement(&state, &request.params).await,
        "denylist_add" => commands::discovery::denylist_add(&state, &request.params).await,
        "denylist_remove" => commands::discovery::denylist_remove(&state, &request.params).await,
        "get_relay_cache" => commands::discovery::get_relay_cache(&state).await,

        // Diagnostics, session lock, event subscription.
        "get_daemon_logs" => commands::diagnostics::get_daemon_logs(&state, &request.params).await,
        "export_diagnostics" => commands::diagnostics::export_diagnostics(&state).await,
        "get_network_stats" => commands::diagnostics::get_network_stats(&state).await,
        "lock_session" => commands::diagnostics::lock_session(&state).await,
        "subscribe_events" => commands::diagnostics::subscribe_events(&state, &request.params).await,
        "unsubscribe_events" => commands::diagnostics::unsubscribe_events(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::session_locked();
        assert_eq!(err.code, -32010);
        assert_eq!(err.message, "SESSION_LOCKED");

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"ok": true}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }
}
