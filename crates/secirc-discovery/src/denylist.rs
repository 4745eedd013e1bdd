//! Confirmed-malicious relays that short-circuit future discovery
//! appearances without re-running the pipeline.

use std::collections::HashSet;

use secirc_types::Hash16;

#[derive(Default)]
pub struct Denylist {
    relay_ids: HashSet<Hash16>,
}

impl Denylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relay_id: Hash16) {
        self.relay_ids.insert(relay_id);
    }

    pub fn remove(&mut self, relay_id: &Hash16) {
        self.relay_ids.remove(relay_id);
    }

    pub fn is_denied(&self, relay_id: &Hash16) -> bool {
        self.relay_ids.contains(relay_id)
    }

    pub fn len(&self) -> usize {
        self.relay_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relay_ids.is_empty()
    }
}
