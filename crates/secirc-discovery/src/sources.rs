//! The four discovery methods that can surface a candidate relay.

use serde::{Deserialize, Serialize};

use crate::{DiscoveryError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Dht,
    Tracker,
    PeerExchange,
    Bootstrap,
}

/// A hardcoded seed endpoint used for the bootstrap discovery method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedNode {
    pub addr: String,
    pub port: u16,
    pub expected_public_key: [u8; 32],
}

/// Bootstrap-method configuration: the seed list plus how many must
/// respond for bootstrap to be considered successful.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub seeds: Vec<SeedNode>,
    pub min_responsive_seeds: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { seeds: Vec::new(), min_responsive_seeds: 1 }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(DiscoveryError::InvalidAddress("no seed nodes configured".into()));
        }
        if self.min_responsive_seeds > self.seeds.len() {
            return Err(DiscoveryError::InvalidAddress(format!(
                "min_responsive_seeds ({}) exceeds configured seed count ({})",
                self.min_responsive_seeds,
                self.seeds.len()
            )));
        }
        Ok(())
    }
}
