//! keylatch - TTL locks and ephemeral cache over Redis
//!
//! Coordinates processes that share nothing but a key-value store:
//! [`lock::LockManager`] gives best-effort mutual exclusion with bounded
//! waiting and cleanup on shutdown, [`cache::CacheManager`] memoizes JSON
//! values with a freshness window. Both sit on the [`store::Store`] trait.
//!
//! ```rust,ignore
//! use keylatch::{CacheManager, LockManager};
//!
//! let store = keylatch::store::connect(&config.store).await?;
//! let locks = LockManager::new(store.clone(), config.lock.clone());
//! let cache = CacheManager::new(store, &config.cache);
//!
//! if locks.acquire("rebuild-index").await {
//!     cache.set("index", &index).await?;
//!     locks.release("rebuild-index").await?;
//! }
//! locks.shutdown().await;
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod store;

pub use cache::CacheManager;
pub use error::{KeylatchError, KeylatchResult, StoreError, StoreResult};
pub use lock::LockManager;
pub use store::Store;
