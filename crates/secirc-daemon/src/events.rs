//! Event emission: the daemon pushes events to RPC subscribers over a
//! broadcast channel with a bounded per-subscriber buffer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "RelayPromoted", "GroupKeyRotated").
    pub event_type: String,
    pub timestamp: u64,
    pub payload: serde_json::Value,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "ring", "trust", "auth", "presence", "group",
    /// "discovery", "system".
    pub categories: Option<Vec<String>>,
    pub min_severity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, sequence: Arc::new(AtomicU64::new(0)) }
    }

    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref categories) = self.categories {
            let event_category = categorize_event(&event.event_type);
            if !categories.contains(&event_category) {
                return false;
            }
        }
        true
    }
}

/// Categorize an event type into the crate that raised it.
fn categorize_event(event_type: &str) -> String {
    match event_type {
        s if s.starts_with("Ring") || s.starts_with("Proposal") || s.starts_with("Member") => {
            "ring".to_string()
        }
        s if s.starts_with("Trust") || s.starts_with("Verification") => "trust".to_string(),
        s if s.starts_with("Session") || s.starts_with("Challenge") || s.starts_with("Auth") => {
            "auth".to_string()
        }
        s if s.starts_with("User") || s.starts_with("Presence") || s.starts_with("Message") => {
            "presence".to_string()
        }
        s if s.starts_with("Group") => "group".to_string(),
        s if s.starts_with("Relay") || s.starts_with("Discovery") => "discovery".to_string(),
        _ => "system".to_string(),
    }
}
