//! Configuration file loading (§6/§33 of the original spec numbering).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Network/transport/discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// 0 = OS-assigned ephemeral port.
    #[serde(default)]
    pub listen_port: u16,
    /// Bootstrap relay seeds ("addr:port").
    #[serde(default = "default_bootstrap_nodes")]
    pub bootstrap_nodes: Vec<String>,
    /// Maximum concurrent transport connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Discovery admission rate-limit: hits per window per source.
    #[serde(default = "default_rate_limit_max")]
    pub discovery_rate_limit_max: usize,
    #[serde(default = "default_rate_limit_window")]
    pub discovery_rate_limit_window_secs: u64,
}

/// Persisted-state settings (§6): where the identity/contacts/relay
/// cache files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    #[serde(default = "default_relay_cache_capacity")]
    pub relay_cache_capacity: usize,
}

/// Client authentication tunables (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_pow_difficulty")]
    pub pow_difficulty: u32,
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

/// Presence and group key rotation tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_presence_timeout")]
    pub presence_timeout_secs: u64,
    #[serde(default = "default_rotation_interval")]
    pub key_rotation_interval_secs: u64,
}

/// Logging and misc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

fn default_bootstrap_nodes() -> Vec<String> {
    vec!["198.51.100.1:4433".to_string(), "198.51.100.2:4433".to_string()]
}
fn default_max_connections() -> u32 {
    256
}
fn default_rate_limit_max() -> usize {
    secirc_discovery::pipeline::DEFAULT_RATE_LIMIT_MAX
}
fn default_rate_limit_window() -> u64 {
    secirc_discovery::pipeline::DEFAULT_RATE_LIMIT_WINDOW_SECS
}
fn default_relay_cache_capacity() -> usize {
    secirc_storage::relay_cache::DEFAULT_CACHE_CAPACITY
}
fn default_pow_difficulty() -> u32 {
    secirc_types::DEFAULT_POW_DIFFICULTY
}
fn default_challenge_ttl() -> u64 {
    300
}
fn default_session_ttl() -> u64 {
    3600
}
fn default_presence_timeout() -> u64 {
    secirc_types::DEFAULT_PRESENCE_TIMEOUT_SECS
}
fn default_rotation_interval() -> u64 {
    secirc_types::DEFAULT_KEY_ROTATION_INTERVAL_SECS
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_port: 0,
            bootstrap_nodes: default_bootstrap_nodes(),
            max_connections: default_max_connections(),
            discovery_rate_limit_max: default_rate_limit_max(),
            discovery_rate_limit_window_secs: default_rate_limit_window(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            relay_cache_capacity: default_relay_cache_capacity(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pow_difficulty: default_pow_difficulty(),
            challenge_ttl_secs: default_challenge_ttl(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            presence_timeout_secs: default_presence_timeout(),
            key_rotation_interval_secs: default_rotation_interval(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

/// Failure to load a well-formed config file — exit code 2 (bad
/// configuration).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl DaemonConfig {
    /// Load configuration from the default config file location, or
    /// fall back to defaults if none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("SECIRC_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("SECIRC_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".secirc"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/secirc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.network.listen_port, 0);
        assert_eq!(config.auth.pow_difficulty, secirc_types::DEFAULT_POW_DIFFICULTY);
        assert_eq!(config.groups.key_rotation_interval_secs, 86400);
    }

    #[test]
    fn test_config_round_trip() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.auth.pow_difficulty, config.auth.pow_difficulty);
    }
}
