//! Per-recipient store-and-forward queues, drained once a recipient
//! comes back online and retried/expired otherwise.

use std::collections::HashMap;

use secirc_types::presence::{DeliveryStatus, OfflineQueue, PendingMessage};
use secirc_types::Hash16;

const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Owns one bounded offline queue per recipient.
pub struct DeliveryManager {
    queues: HashMap<Hash16, OfflineQueue>,
    queue_capacity: usize,
}

impl Default for DeliveryManager {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl DeliveryManager {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queues: HashMap::new(),
            queue_capacity,
        }
    }

    /// Enqueues a message for a currently-unreachable recipient.
    pub fn queue_message(&mut self, message: PendingMessage) {
        self.queues
            .entry(message.recipient_hash)
            .or_insert_with(|| OfflineQueue::new(self.queue_capacity))
            .push(message);
    }

    pub fn pending_count(&self, recipient: &Hash16) -> usize {
        self.queues.get(recipient).map_or(0, OfflineQueue::len)
    }

    /// Recipients with at least one queued message, for the scheduler's
    /// redelivery sweep to check against presence.
    pub fn recipients_with_pending(&self) -> Vec<Hash16> {
        self.queues.iter().filter(|(_, q)| !q.is_empty()).map(|(recipient, _)| *recipient).collect()
    }

    /// Drains every queued message for a recipient that has just come
    /// online, in original insertion order, for immediate redelivery.
    pub fn deliver_pending(&mut self, recipient: &Hash16) -> Vec<PendingMessage> {
        self.queues
            .get_mut(recipient)
            .map(OfflineQueue::drain_in_order)
            .unwrap_or_default()
    }

    /// Records a failed delivery attempt: requeues at the front if the
    /// message can still be retried, otherwise marks it failed and
    /// drops it.
    pub fn record_delivery_failure(&mut self, recipient: &Hash16, mut message: PendingMessage) {
        message.attempts += 1;
        if message.exhausted_attempts() {
            message.status = DeliveryStatus::Failed;
            return;
        }
        if let Some(queue) = self.queues.get_mut(recipient) {
            queue.requeue_front(message);
        }
    }

    /// Removes expired messages across every recipient queue, returning
    /// how many were dropped.
    pub fn cleanup_expired(&mut self, now: u64) -> usize {
        let mut dropped = 0;
        for queue in self.queues.values_mut() {
            let kept: Vec<PendingMessage> = queue
                .drain_in_order()
                .into_iter()
                .filter(|m| {
                    let expired = m.is_expired(now);
                    if expired {
                        dropped += 1;
                    }
                    !expired
                })
                .collect();
            for message in kept {
                queue.push(message);
            }
        }
        dropped
    }
}
