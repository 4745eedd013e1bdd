//! A JSON list of last-known relay announcements, so a restarting
//! process has somewhere to start bootstrapping from before discovery
//! produces fresh candidates.

use std::path::Path;

use secirc_types::network::RelayAnnouncement;
use secirc_types::Hash16;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Bounds the cache so a long-lived process doesn't accumulate an
/// unbounded number of stale announcements.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelayCache {
    announcements: Vec<RelayAnnouncement>,
    capacity: usize,
}

impl RelayCache {
    pub fn new(capacity: usize) -> Self {
        Self { announcements: Vec::new(), capacity }
    }

    /// Inserts or replaces the announcement for `relay_id`, evicting the
    /// oldest entry by `last_seen` if the cache is at capacity.
    pub fn upsert(&mut self, announcement: RelayAnnouncement) {
        if let Some(existing) = self.announcements.iter_mut().find(|a| a.relay_id == announcement.relay_id) {
            *existing = announcement;
            return;
        }
        if self.capacity > 0 && self.announcements.len() >= self.capacity {
            if let Some((idx, _)) = self
                .announcements
                .iter()
                .enumerate()
                .min_by_key(|(_, a)| a.last_seen)
            {
                self.announcements.remove(idx);
            }
        }
        self.announcements.push(announcement);
    }

    pub fn get(&self, relay_id: &Hash16) -> Option<&RelayAnnouncement> {
        self.announcements.iter().find(|a| &a.relay_id == relay_id)
    }

    pub fn all(&self) -> &[RelayAnnouncement] {
        &self.announcements
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(capacity));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
