//! # secirc-transport
//!
//! Transport fan-out: maintains a pool of outgoing connections to peer
//! relays across three transport families (direct TCP with optional
//! TLS, SOCKS-over-Tor, WebSocket over TLS), each driven by a per-peer
//! state machine with heartbeat monitoring and exponential-backoff
//! reconnect.
//!
//! ## Modules
//!
//! - [`connection`] — per-peer connection record and state transitions
//! - [`manager`] — the connection pool: add/send/broadcast, heartbeat
//!   and reconnect tasks, bounded-grace-period shutdown

pub mod connection;
pub mod manager;

pub use connection::{ConnectionStatus, PeerConnection, TransportKind};
pub use manager::{ConnectionManager, SendOutcome, TransportConfig};

/// Errors from the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0:?} is not known to the connection manager")]
    PeerUnknown(secirc_types::Hash16),
    #[error("peer {0:?} is not authenticated")]
    NotAuthenticated(secirc_types::Hash16),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
