//! Per-type sequence bookkeeping: allocation on seal, replay rejection
//! on open.

use std::collections::{HashMap, HashSet, VecDeque};

use secirc_types::{MessageType, REPLAY_WINDOW_SIZE};

/// Allocates the next monotonic sequence number for each message type,
/// used by a sender when sealing.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    counters: HashMap<MessageType, u64>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, message_type: MessageType) -> u64 {
        let counter = self.counters.entry(message_type).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Tracks the last [`REPLAY_WINDOW_SIZE`] sequence numbers seen per
/// message type, on the receiving side, evicting the oldest once full.
#[derive(Debug, Default)]
pub struct ReplayWindow {
    seen: HashMap<MessageType, TypeWindow>,
}

#[derive(Debug, Default)]
struct TypeWindow {
    order: VecDeque<u64>,
    set: HashSet<u64>,
}

impl ReplayWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `sequence_number` has not been seen before for
    /// `message_type`, and records it. Returns `false` on a replay.
    pub fn observe(&mut self, message_type: MessageType, sequence_number: u64) -> bool {
        let window = self.seen.entry(message_type).or_default();
        if window.set.contains(&sequence_number) {
            return false;
        }
        window.set.insert(sequence_number);
        window.order.push_back(sequence_number);
        if window.order.len() > REPLAY_WINDOW_SIZE {
            if let Some(oldest) = window.order.pop_front() {
                window.set.remove(&oldest);
            }
        }
        true
    }
}
