//! Ephemeral structured-value cache
//!
//! Values are serialized to JSON and stored under the `CAS:` namespace with
//! an optional TTL. Readers never see errors for missing, expired or
//! corrupt entries; all three are a cache miss.
//!
//! | Stored state | `get` returns |
//! |--------------|---------------|
//! | Present, decodes | the value |
//! | Absent / expired | `T::default()` |
//! | Present, malformed | `T::default()` |

pub mod manager;

pub use manager::{cache_key, CacheManager, CACHE_PREFIX};
