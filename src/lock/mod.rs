//! Best-effort, TTL-bounded mutual exclusion over a shared store
//!
//! A lock is a `LOCK:<name>` key created with set-if-absent and then given a
//! TTL, so a holder that dies without releasing cannot block others for
//! longer than the TTL. There is no fencing token: a holder that outlives
//! its TTL can lose the lock silently.
//!
//! # Lock lifecycle (per key, from the acquiring process)
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Unheld | set-if-absent + expire succeed | Held |
//! | Held | `refresh` / `keep_alive` tick | Held (TTL restarted) |
//! | Held | `release` | Unheld |
//! | Held | TTL expiry in the store | Unheld |
//! | Held | `shutdown` drain | Unheld |

pub mod manager;

pub use manager::{lock_key, LockManager, LockStatus, LOCK_PREFIX};
