//! Configuration schema for keylatch
//!
//! Configuration is stored at `~/.config/keylatch/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Key-value store connection
    pub store: StoreConfig,

    /// Lock acquisition policy
    pub lock: LockConfig,

    /// Cache defaults
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store URL: redis://, rediss:// or memory://
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Lock retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Total set-if-absent attempts per acquisition, including the first
    pub max_attempts: u32,

    /// Delay between attempts in microseconds
    pub wait_micros: u64,

    /// TTL applied when the caller passes a non-positive one
    pub default_ttl_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            wait_micros: 1000,
            default_ttl_secs: 3,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL used by `set` when none is given (0 = never expire)
    pub default_ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 600,
        }
    }
}
