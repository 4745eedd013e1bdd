//! User presence and the offline store-and-forward queue.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Hash16, MessageId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Offline,
    Online,
    Away,
    Busy,
    Invisible,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPresence {
    pub user: Hash16,
    pub status: PresenceStatus,
    pub last_seen: u64,
    pub server: Hash16,
    pub session: crate::SessionId,
    #[serde_as(as = "serde_with::Bytes")]
    pub pk: [u8; 32],
    pub nickname: String,
    pub status_message: String,
}

impl UserPresence {
    pub fn mark_online(&mut self, now: u64) {
        self.status = PresenceStatus::Online;
        self.last_seen = now;
    }

    /// `last_seen` is left untouched on logout/timeout — the offline
    /// queue keyed by `user` must stay intact across status flips.
    pub fn mark_offline(&mut self) {
        self.status = PresenceStatus::Offline;
    }

    pub fn is_stale(&self, now: u64, presence_timeout_secs: u64) -> bool {
        self.status == PresenceStatus::Online
            && now.saturating_sub(self.last_seen) > presence_timeout_secs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingMessage {
    pub message_id: MessageId,
    pub sender_hash: Hash16,
    pub recipient_hash: Hash16,
    pub message_type: crate::MessageType,
    pub ciphertext: Vec<u8>,
    pub ttl: u64,
    pub attempts: u32,
    pub max_attempts: u32,
    pub status: DeliveryStatus,
    pub enqueued_ts: u64,
}

impl PendingMessage {
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.enqueued_ts) > self.ttl
    }

    pub fn exhausted_attempts(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// A per-recipient bounded FIFO offline queue.
#[derive(Clone, Debug, Default)]
pub struct OfflineQueue {
    queue: VecDeque<PendingMessage>,
    capacity: usize,
}

impl OfflineQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Push a message, evicting the oldest entry if the queue is at
    /// capacity.
    pub fn push(&mut self, message: PendingMessage) {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(message);
    }

    pub fn pop_next(&mut self) -> Option<PendingMessage> {
        self.queue.pop_front()
    }

    pub fn requeue_front(&mut self, message: PendingMessage) {
        self.queue.push_front(message);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain messages in insertion order, for re-queuing when a user
    /// comes back online.
    pub fn drain_in_order(&mut self) -> Vec<PendingMessage> {
        self.queue.drain(..).collect()
    }
}
