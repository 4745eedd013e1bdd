//! The connection pool: tracks one [`PeerConnection`] per peer, exposes
//! `send`/`broadcast`, and drives background heartbeat and reconnect
//! loops until shut down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use secirc_types::Hash16;

use crate::connection::{ConnectionStatus, PeerConnection, TransportKind};

/// Tunables for the connection pool, defaulted to match the relay
/// core's original connection-management constants.
#[derive(Clone, Copy, Debug)]
pub struct TransportConfig {
    pub min_connections: usize,
    pub max_connections: usize,
    pub connection_timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub reconnect_interval_secs: u64,
    pub max_retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            min_connections: 3,
            max_connections: 10,
            connection_timeout_secs: 30,
            heartbeat_interval_secs: 60,
            reconnect_interval_secs: 30,
            max_retry_attempts: 3,
            retry_delay_secs: 30,
        }
    }
}

/// Outcome of a `send` call, mirroring the send contract: a peer may be
/// unknown, known but not yet authenticated, or sending may fail at the
/// I/O layer.
#[derive(Debug)]
pub enum SendOutcome {
    Ok,
    PeerUnknown,
    NotAuthenticated,
    Io(String),
}

/// A sink a connection manager can hand frames to. Deliberately
/// synchronous: the real socket I/O runs on a background task that
/// owns an `UnboundedSender<Vec<u8>>`, which implements this trait
/// directly since its `send` never blocks.
pub trait Sink: Send + Sync {
    fn try_send(&self, bytes: &[u8]) -> std::io::Result<()>;
}

impl Sink for tokio::sync::mpsc::UnboundedSender<Vec<u8>> {
    fn try_send(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.send(bytes.to_vec())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }
}

struct Entry {
    conn: PeerConnection,
    sink: Option<Arc<dyn Sink>>,
}

/// The connection pool. Cloneable cheaply; clones share the same
/// underlying table.
#[derive(Clone)]
pub struct ConnectionManager {
    config: TransportConfig,
    entries: Arc<RwLock<HashMap<Hash16, Entry>>>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn add_peer(
        &self,
        peer: Hash16,
        kind: TransportKind,
        host: impl Into<String>,
        port: u16,
        now: u64,
    ) {
        let conn = PeerConnection::new(
            peer,
            kind,
            host,
            port,
            self.config.max_retry_attempts,
            self.config.retry_delay_secs,
            now,
        );
        self.entries
            .write()
            .await
            .insert(peer, Entry { conn, sink: None });
    }

    pub async fn attach_sink(&self, peer: &Hash16, sink: Arc<dyn Sink>, now: u64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(peer) {
            entry.sink = Some(sink);
            entry.conn.mark_connected(now);
        }
    }

    pub async fn mark_authenticated(&self, peer: &Hash16, now: u64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(peer) {
            entry.conn.mark_authenticated(now);
        }
    }

    pub async fn record_heartbeat(&self, peer: &Hash16, now: u64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(peer) {
            entry.conn.record_heartbeat(now);
        }
    }

    pub async fn status(&self, peer: &Hash16) -> Option<ConnectionStatus> {
        self.entries.read().await.get(peer).map(|e| e.conn.status)
    }

    /// Sends a frame to one peer, requiring it to be authenticated.
    pub async fn send(&self, peer: &Hash16, bytes: &[u8]) -> SendOutcome {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(peer) else {
            return SendOutcome::PeerUnknown;
        };
        if entry.conn.status != ConnectionStatus::Authenticated {
            return SendOutcome::NotAuthenticated;
        }
        let Some(sink) = &entry.sink else {
            return SendOutcome::NotAuthenticated;
        };
        match sink.try_send(bytes) {
            Ok(()) => SendOutcome::Ok,
            Err(e) => SendOutcome::Io(e.to_string()),
        }
    }

    /// Sends a frame to every authenticated peer, returning the peers
    /// it failed to reach.
    pub async fn broadcast(&self, bytes: &[u8]) -> Vec<Hash16> {
        let entries = self.entries.read().await;
        let mut failed = Vec::new();
        for (peer, entry) in entries.iter() {
            if entry.conn.status != ConnectionStatus::Authenticated {
                continue;
            }
            let sent = entry
                .sink
                .as_ref()
                .is_some_and(|sink| sink.try_send(bytes).is_ok());
            if !sent {
                failed.push(*peer);
            }
        }
        failed
    }

    pub async fn authenticated_peers(&self) -> Vec<Hash16> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.conn.status == ConnectionStatus::Authenticated)
            .map(|(peer, _)| *peer)
            .collect()
    }

    /// Spawns the heartbeat-miss detector. A tick with no heartbeat
    /// recorded since the previous tick counts as a miss; two misses
    /// fails the connection per [`PeerConnection::note_missed_heartbeat`].
    pub fn spawn_heartbeat_task(&self, now_secs: impl Fn() -> u64 + Send + Sync + 'static) -> tokio::task::JoinHandle<()> {
        let entries = self.entries.clone();
        let interval = Duration::from_secs(self.config.heartbeat_interval_secs);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let now = now_secs();
                let mut entries = entries.write().await;
                for entry in entries.values_mut() {
                    if !matches!(
                        entry.conn.status,
                        ConnectionStatus::Connected | ConnectionStatus::Authenticated
                    ) {
                        continue;
                    }
                    let stale = entry
                        .conn
                        .last_heartbeat
                        .is_none_or(|last| now.saturating_sub(last) >= interval.as_secs());
                    if stale {
                        entry.conn.note_missed_heartbeat();
                    }
                }
            }
        })
    }

    /// Spawns the reconnect sweep: any `Failed` connection within its
    /// retry budget is moved to `Reconnecting` so an external dialer
    /// task can pick it up again.
    pub fn spawn_reconnect_task(&self) -> tokio::task::JoinHandle<()> {
        let entries = self.entries.clone();
        let interval = Duration::from_secs(self.config.reconnect_interval_secs);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let mut entries = entries.write().await;
                for entry in entries.values_mut() {
                    if entry.conn.status == ConnectionStatus::Failed {
                        entry.conn.begin_reconnect();
                    }
                }
            }
        })
    }

    /// Signals background tasks to stop, then waits up to `grace`
    /// before returning regardless of whether they've exited.
    pub async fn shutdown(&self, grace: Duration) {
        self.cancel.cancel();
        tokio::time::sleep(grace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_send_to_unknown_peer() {
        let mgr = ConnectionManager::new(TransportConfig::default());
        let outcome = mgr.send(&[9u8; 16], b"hi").await;
        assert!(matches!(outcome, SendOutcome::PeerUnknown));
    }

    #[tokio::test]
    async fn test_send_requires_authentication() {
        let mgr = ConnectionManager::new(TransportConfig::default());
        let peer = [1u8; 16];
        mgr.add_peer(peer, TransportKind::Tcp { tls: true }, "host", 6667, 0)
            .await;
        let outcome = mgr.send(&peer, b"hi").await;
        assert!(matches!(outcome, SendOutcome::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_send_succeeds_once_authenticated() {
        let mgr = ConnectionManager::new(TransportConfig::default());
        let peer = [1u8; 16];
        mgr.add_peer(peer, TransportKind::Tcp { tls: true }, "host", 6667, 0)
            .await;
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        mgr.attach_sink(&peer, Arc::new(tx), 1).await;
        mgr.mark_authenticated(&peer, 2).await;
        let outcome = mgr.send(&peer, b"hi").await;
        assert!(matches!(outcome, SendOutcome::Ok));
        assert_eq!(rx.recv().await.unwrap(), b"hi");
    }

    #[tokio::test]
    async fn test_broadcast_skips_unauthenticated_peers() {
        let mgr = ConnectionManager::new(TransportConfig::default());
        let authed = [1u8; 16];
        let pending = [2u8; 16];
        mgr.add_peer(authed, TransportKind::Tcp { tls: true }, "a", 1, 0)
            .await;
        mgr.add_peer(pending, TransportKind::Tcp { tls: true }, "b", 1, 0)
            .await;
        let (tx, _rx) = mpsc::unbounded_channel::<Vec<u8>>();
        mgr.attach_sink(&authed, Arc::new(tx), 1).await;
        mgr.mark_authenticated(&authed, 2).await;
        let failed = mgr.broadcast(b"hi").await;
        assert!(failed.is_empty());
        assert_eq!(mgr.authenticated_peers().await, vec![authed]);
    }
}
