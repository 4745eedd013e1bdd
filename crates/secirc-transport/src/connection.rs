//! Per-peer connection record and its state machine.
//!
//! Mirrors the three transport families a relay can reach a peer
//! through, and the lifecycle a single outgoing connection goes
//! through regardless of which family carries it.

use secirc_types::Hash16;

/// Which transport family carries a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Tcp { tls: bool },
    SocksTor,
    WebSocket { tls: bool },
}

/// Lifecycle state of a single outgoing connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
    Reconnecting,
    Failed,
}

/// A tracked outgoing connection to one peer relay.
#[derive(Clone, Debug)]
pub struct PeerConnection {
    pub peer: Hash16,
    pub kind: TransportKind,
    pub host: String,
    pub port: u16,
    pub status: ConnectionStatus,
    pub last_heartbeat: Option<u64>,
    pub last_seen: Option<u64>,
    pub missed_heartbeats: u32,
    pub connection_attempts: u32,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub priority: u8,
    pub created_at: u64,
}

impl PeerConnection {
    pub fn new(
        peer: Hash16,
        kind: TransportKind,
        host: impl Into<String>,
        port: u16,
        max_attempts: u32,
        retry_delay_secs: u64,
        now: u64,
    ) -> Self {
        Self {
            peer,
            kind,
            host: host.into(),
            port,
            status: ConnectionStatus::Disconnected,
            last_heartbeat: None,
            last_seen: None,
            missed_heartbeats: 0,
            connection_attempts: 0,
            max_attempts,
            retry_delay_secs,
            priority: 0,
            created_at: now,
        }
    }

    pub fn begin_connecting(&mut self) {
        self.status = ConnectionStatus::Connecting;
        self.connection_attempts += 1;
    }

    pub fn mark_connected(&mut self, now: u64) {
        self.status = ConnectionStatus::Connected;
        self.connection_attempts = 0;
        self.last_seen = Some(now);
    }

    pub fn mark_authenticated(&mut self, now: u64) {
        self.status = ConnectionStatus::Authenticated;
        self.last_seen = Some(now);
    }

    pub fn record_heartbeat(&mut self, now: u64) {
        self.last_heartbeat = Some(now);
        self.last_seen = Some(now);
        self.missed_heartbeats = 0;
    }

    /// Called each heartbeat tick when no heartbeat has arrived since the
    /// last tick. Two consecutive misses fails the connection.
    pub fn note_missed_heartbeat(&mut self) {
        self.missed_heartbeats += 1;
        if self.missed_heartbeats >= 2 {
            self.status = ConnectionStatus::Failed;
        }
    }

    /// Transitions a failed connection into backoff, or gives up once
    /// `max_attempts` has been exhausted.
    pub fn begin_reconnect(&mut self) -> bool {
        if self.connection_attempts >= self.max_attempts {
            self.status = ConnectionStatus::Failed;
            return false;
        }
        self.status = ConnectionStatus::Reconnecting;
        true
    }

    /// Exponential backoff delay for the current attempt count, in
    /// seconds, based on `retry_delay_secs` as the base.
    pub fn backoff_secs(&self) -> u64 {
        self.retry_delay_secs
            .saturating_mul(1u64 << self.connection_attempts.min(6))
    }

    pub fn is_usable(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::Authenticated
        )
    }
}
