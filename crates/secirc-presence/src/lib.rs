//! # secirc-presence
//!
//! Presence tracking and store-and-forward delivery (§4.8): an online
//! registry keyed by user hash, and a bounded per-recipient offline
//! queue that redelivers once a recipient returns.

pub mod delivery;
pub mod registry;

pub use delivery::DeliveryManager;
pub use registry::PresenceRegistry;

use secirc_types::Hash16;

/// Errors from presence/delivery operations.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("no presence record for user {0:?}")]
    UnknownUser(Hash16),
}

pub type Result<T> = std::result::Result<T, PresenceError>;
