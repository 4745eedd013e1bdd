//! Shared rotation policy for brokered group keys: a scheduled interval
//! (default 24h, matching the original implementation's
//! `key_rotation_interval`) plus immediate rotation whenever membership
//! changes, which callers trigger directly via [`brokered::rotate`](crate::brokered::rotate).

use secirc_types::group::GroupKey;

pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 86_400;

#[derive(Clone, Copy, Debug)]
pub struct KeyRotationPolicy {
    pub interval_secs: u64,
}

impl Default for KeyRotationPolicy {
    fn default() -> Self {
        Self { interval_secs: DEFAULT_ROTATION_INTERVAL_SECS }
    }
}

impl KeyRotationPolicy {
    pub fn new(interval_secs: u64) -> Self {
        Self { interval_secs }
    }

    /// Whether `key` is due for a scheduled rotation.
    pub fn is_due(&self, key: &GroupKey, now: u64) -> bool {
        now >= key.expires_ts
    }
}
