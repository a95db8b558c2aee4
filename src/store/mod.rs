//! Key-value store abstraction
//!
//! The lock and cache managers only need five primitives from a backend:
//! atomic set-if-absent, expire, get, set with optional TTL and a batched
//! delete. Any service that offers them can implement [`Store`].
//!
//! - `redis://` / `rediss://`: [`RedisStore`] over a reconnecting connection manager
//! - `memory://`: [`MemoryStore`], process-local with lazy TTL expiry

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::config::schema::StoreConfig;
use crate::error::{KeylatchError, KeylatchResult, StoreResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability interface over an external key-value service
///
/// Implementations must be safe to call concurrently from many tasks.
/// Every method may fail with a transport error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically create `key` holding `value`; `true` iff it did not exist
    async fn set_if_absent(&self, key: &str, value: &[u8]) -> StoreResult<bool>;

    /// Set or refresh the TTL of an existing key; `false` if the key is missing
    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;

    /// Read the raw bytes at `key`
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` at `key`, expiring after `ttl_secs` when given
    async fn set(&self, key: &str, value: &[u8], ttl_secs: Option<u64>) -> StoreResult<bool>;

    /// Delete every key in `keys` in one round trip, returning how many existed
    async fn delete(&self, keys: &[String]) -> StoreResult<u64>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Supported store backends, chosen by URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redis,
    Memory,
}

impl Backend {
    /// Detect the backend for a store URL
    pub fn from_url(url: &str) -> KeylatchResult<Self> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme);
        match scheme {
            Some("redis") | Some("rediss") => Ok(Self::Redis),
            Some("memory") => Ok(Self::Memory),
            _ => Err(KeylatchError::UnsupportedStore(url.to_string())),
        }
    }
}

/// Open the store described by the configuration
pub async fn connect(config: &StoreConfig) -> KeylatchResult<Arc<dyn Store>> {
    match Backend::from_url(&config.url)? {
        Backend::Redis => Ok(Arc::new(RedisStore::connect(&config.url).await?)),
        Backend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
