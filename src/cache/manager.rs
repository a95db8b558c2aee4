//! Cache manager built directly on the store

use crate::config::schema::CacheConfig;
use crate::error::KeylatchResult;
use crate::store::Store;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Namespace tag for cache keys
pub const CACHE_PREFIX: &str = "CAS:";

/// Build the store key for a cache entry
pub fn cache_key(key: &str) -> String {
    format!("{CACHE_PREFIX}{key}")
}

/// Namespaced get/set/delete of JSON values with a freshness window
pub struct CacheManager {
    store: Arc<dyn Store>,
    default_ttl_secs: i64,
}

impl CacheManager {
    /// Create a cache manager over a shared store
    pub fn new(store: Arc<dyn Store>, config: &CacheConfig) -> Self {
        Self {
            store,
            default_ttl_secs: config.default_ttl_secs,
        }
    }

    /// Store `value` under `key` with the configured default TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KeylatchResult<bool> {
        self.set_with_ttl(key, value, self.default_ttl_secs).await
    }

    /// Store `value` under `key`; a non-positive `ttl_secs` never expires
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: i64,
    ) -> KeylatchResult<bool> {
        let key = cache_key(key);
        let payload = serde_json::to_vec(value)?;
        let ttl = (ttl_secs > 0).then_some(ttl_secs as u64);

        let stored = self.store.set(&key, &payload, ttl).await?;
        debug!(%key, ?ttl, bytes = payload.len(), "cache set");
        Ok(stored)
    }

    /// Read the value under `key`, or `T::default()` on a miss
    ///
    /// Content that does not decode into `T` counts as a miss. Only
    /// transport failures are returned as errors.
    pub async fn get<T: DeserializeOwned + Default>(&self, key: &str) -> KeylatchResult<T> {
        let key = cache_key(key);
        let Some(raw) = self.store.get(&key).await? else {
            debug!(%key, "cache miss");
            return Ok(T::default());
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(%key, error = %e, "malformed cache entry treated as miss");
                Ok(T::default())
            }
        }
    }

    /// Remove the entry under `key`, returning how many keys were deleted
    pub async fn delete(&self, key: &str) -> KeylatchResult<u64> {
        let key = cache_key(key);
        let removed = self.store.delete(std::slice::from_ref(&key)).await?;
        debug!(%key, removed, "cache delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KeylatchError, StoreError, StoreResult};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Map, Value};
    use std::time::Duration;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        visits: u32,
    }

    fn test_cache() -> (CacheManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheManager::new(store.clone(), &CacheConfig::default());
        (cache, store)
    }

    #[tokio::test(start_paused = true)]
    async fn set_then_get_until_expiry() {
        let (cache, _store) = test_cache();
        let profile = Profile {
            name: "ada".to_string(),
            visits: 3,
        };

        assert!(cache.set_with_ttl("k", &profile, 5).await.unwrap());
        let read: Profile = cache.get("k").await.unwrap();
        assert_eq!(read, profile);

        tokio::time::advance(Duration::from_secs(5)).await;

        let read: Profile = cache.get("k").await.unwrap();
        assert_eq!(read, Profile::default());
    }

    #[tokio::test]
    async fn default_ttl_is_applied() {
        let (cache, store) = test_cache();
        cache.set("k", &json!({"a": 1})).await.unwrap();

        let ttl = store.ttl("CAS:k").unwrap();
        assert!(ttl <= Duration::from_secs(600));
        assert!(ttl > Duration::from_secs(590));
    }

    #[tokio::test]
    async fn non_positive_ttl_never_expires() {
        let (cache, store) = test_cache();
        cache.set_with_ttl("zero", &json!({}), 0).await.unwrap();
        cache.set_with_ttl("negative", &json!({}), -1).await.unwrap();

        assert_eq!(store.ttl("CAS:zero"), None);
        assert_eq!(store.ttl("CAS:negative"), None);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn missing_key_returns_default() {
        let (cache, _store) = test_cache();
        let read: Map<String, Value> = cache.get("absent").await.unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn malformed_content_is_a_miss() {
        let (cache, store) = test_cache();
        store.set("CAS:k", b"{not json", None).await.unwrap();

        let read: Map<String, Value> = cache.get("k").await.unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_is_a_miss() {
        let (cache, _store) = test_cache();
        cache.set("k", &json!([1, 2, 3])).await.unwrap();

        let read: Profile = cache.get("k").await.unwrap();
        assert_eq!(read, Profile::default());
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let (cache, store) = test_cache();
        cache.set("k", &json!({"a": 1})).await.unwrap();

        assert_eq!(cache.delete("k").await.unwrap(), 1);
        assert_eq!(cache.delete("k").await.unwrap(), 0);
        assert!(store.is_empty());
    }

    struct DownStore;

    #[async_trait]
    impl Store for DownStore {
        async fn set_if_absent(&self, _: &str, _: &[u8]) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn expire(&self, _: &str, _: u64) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn get(&self, _: &str) -> StoreResult<Option<Vec<u8>>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn set(&self, _: &str, _: &[u8], _: Option<u64>) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn delete(&self, _: &[String]) -> StoreResult<u64> {
            Err(StoreError::Unavailable("down".into()))
        }
        fn backend_name(&self) -> &'static str {
            "down"
        }
    }

    #[tokio::test]
    async fn transport_errors_surface() {
        let cache = CacheManager::new(Arc::new(DownStore), &CacheConfig::default());

        assert!(matches!(
            cache.get::<Profile>("k").await,
            Err(KeylatchError::Store(_))
        ));
        assert!(cache.set("k", &json!({})).await.is_err());
        assert!(cache.delete("k").await.is_err());
    }
}
