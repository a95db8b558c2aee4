//! Lock manager with per-process holder tracking

use crate::config::schema::LockConfig;
use crate::error::{KeylatchResult, StoreResult};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Namespace tag for lock keys
pub const LOCK_PREFIX: &str = "LOCK:";

/// Build the store key for a lock name
pub fn lock_key(name: &str) -> String {
    format!("{LOCK_PREFIX}{name}")
}

/// What the store currently says about a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No key exists for the lock
    Free,
    /// Someone holds it; `since` is the recorded acquisition time if readable
    Held { since: Option<DateTime<Utc>> },
}

/// Named mutual exclusion with bounded retry and guaranteed cleanup
///
/// Every lock this manager acquires is recorded in its holder set until
/// released. Call [`LockManager::shutdown`] before the process exits so the
/// remaining locks are deleted in one batch instead of lingering until
/// their TTL runs out.
pub struct LockManager {
    store: Arc<dyn Store>,
    policy: LockConfig,
    held: Mutex<Vec<String>>,
    cleanup_armed: AtomicBool,
    closed: AtomicBool,
}

impl LockManager {
    /// Create a lock manager over a shared store
    pub fn new(store: Arc<dyn Store>, policy: LockConfig) -> Self {
        Self {
            store,
            policy,
            held: Mutex::new(Vec::new()),
            cleanup_armed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Acquire `name` with the configured default TTL
    pub async fn acquire(&self, name: &str) -> bool {
        self.acquire_with_ttl(name, 0).await
    }

    /// Acquire `name`, expiring after `ttl_secs` (non-positive means default)
    ///
    /// Retries up to `max_attempts` times, sleeping `wait_micros` between
    /// attempts. Store failures count as a failed attempt and are never
    /// returned. Returns `false` once the attempts are exhausted.
    pub async fn acquire_with_ttl(&self, name: &str, ttl_secs: i64) -> bool {
        if name.is_empty() {
            warn!("refusing to acquire a lock with an empty name");
            return false;
        }
        if self.is_closed() {
            warn!(%name, "lock manager is shut down, not acquiring");
            return false;
        }

        let key = lock_key(name);
        let ttl = self.effective_ttl(ttl_secs);
        let attempts = self.policy.max_attempts.max(1);
        let wait = Duration::from_micros(self.policy.wait_micros);

        for attempt in 1..=attempts {
            match self.try_lock(&key, ttl).await {
                Ok(true) => {
                    if self.track(&key) {
                        info!(%key, ttl, attempt, "lock acquired");
                        return true;
                    }
                    // Shut down while we were acquiring; hand the key back.
                    self.discard(&key).await;
                    return false;
                }
                Ok(false) => debug!(%key, attempt, "lock held elsewhere"),
                Err(e) => warn!(%key, attempt, error = %e, "lock attempt failed"),
            }

            if attempt < attempts {
                tokio::time::sleep(wait).await;
            }
        }

        debug!(%key, attempts, "lock not acquired");
        false
    }

    /// Release `name`, deleting its key from the store
    ///
    /// Releasing a lock this process does not hold is a no-op. A store
    /// failure is returned and leaves the holder set unchanged.
    pub async fn release(&self, name: &str) -> KeylatchResult<()> {
        let key = lock_key(name);
        let removed = self.store.delete(slice::from_ref(&key)).await?;

        self.holders().retain(|k| *k != key);

        debug!(%key, removed, "lock released");
        Ok(())
    }

    /// Delete every held lock in a single batch
    ///
    /// Store failures are logged and swallowed; the keys stay tracked and
    /// the store TTL remains the backstop.
    pub async fn release_all(&self) {
        let keys = std::mem::take(&mut *self.holders());
        if keys.is_empty() {
            return;
        }

        match self.store.delete(&keys).await {
            Ok(removed) => info!(count = keys.len(), removed, "released all held locks"),
            Err(e) => {
                warn!(count = keys.len(), error = %e, "failed to release held locks");
                let mut held = self.holders();
                let newer = std::mem::replace(&mut *held, keys);
                held.extend(newer);
            }
        }
    }

    /// Drain all held locks and refuse further acquisitions
    ///
    /// Runs at most once; later calls are no-ops.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("lock manager already shut down");
            return;
        }
        self.release_all().await;
    }

    /// Push the expiry of a held lock `ttl_secs` into the future
    ///
    /// Returns `Ok(false)` if this manager does not hold `name` or the key
    /// has already expired in the store.
    pub async fn refresh(&self, name: &str, ttl_secs: i64) -> KeylatchResult<bool> {
        let key = lock_key(name);
        if !self.holders().contains(&key) {
            return Ok(false);
        }

        let ttl = self.effective_ttl(ttl_secs);
        let extended = self.store.expire(&key, ttl).await?;
        if extended {
            debug!(%key, ttl, "lock refreshed");
        } else {
            warn!(%key, "lock expired before it could be refreshed");
        }
        Ok(extended)
    }

    /// Drive `work` to completion, refreshing `name` every half TTL
    ///
    /// Refresh failures are logged; `work` keeps running either way.
    pub async fn keep_alive<F: Future>(&self, name: &str, ttl_secs: i64, work: F) -> F::Output {
        let period = Duration::from_millis(self.effective_ttl(ttl_secs) * 500);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(work);

        loop {
            tokio::select! {
                output = &mut work => return output,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh(name, ttl_secs).await {
                        warn!(%name, error = %e, "lock refresh failed");
                    }
                }
            }
        }
    }

    /// Run `work` while holding `name`, releasing it afterwards
    ///
    /// Returns `Ok(None)` without running `work` if the lock could not be
    /// acquired. If the release fails the key stays tracked for
    /// [`LockManager::shutdown`] and the output is still returned.
    pub async fn with_lock<F, Fut, T>(
        &self,
        name: &str,
        ttl_secs: i64,
        work: F,
    ) -> KeylatchResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.acquire_with_ttl(name, ttl_secs).await {
            return Ok(None);
        }

        let output = work().await;

        if let Err(e) = self.release(name).await {
            warn!(%name, error = %e, "release after scoped work failed");
        }
        Ok(Some(output))
    }

    /// Read the current state of `name` from the store
    pub async fn inspect(&self, name: &str) -> KeylatchResult<LockStatus> {
        let raw = self.store.get(&lock_key(name)).await?;
        Ok(match raw {
            None => LockStatus::Free,
            Some(bytes) => LockStatus::Held {
                since: std::str::from_utf8(&bytes)
                    .ok()
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            },
        })
    }

    /// Snapshot of the lock keys this manager holds, in acquisition order
    pub fn held_keys(&self) -> Vec<String> {
        self.holders().clone()
    }

    /// Whether [`LockManager::shutdown`] has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn effective_ttl(&self, ttl_secs: i64) -> u64 {
        if ttl_secs > 0 {
            ttl_secs as u64
        } else {
            self.policy.default_ttl_secs.max(1)
        }
    }

    async fn try_lock(&self, key: &str, ttl: u64) -> StoreResult<bool> {
        let stamp = Utc::now().timestamp().to_string();
        match self.store.set_if_absent(key, stamp.as_bytes()).await {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => {
                self.bound_orphan(key, &stamp, ttl).await;
                return Err(e);
            }
        }

        // A key without TTL must never be considered held.
        match self.store.expire(key, ttl).await {
            Ok(applied) => Ok(applied),
            Err(e) => {
                self.discard(key).await;
                Err(e)
            }
        }
    }

    // The write may have landed even though the reply was lost. If the key
    // carries our stamp, give it a TTL so it cannot outlive us.
    async fn bound_orphan(&self, key: &str, stamp: &str, ttl: u64) {
        match self.store.get(key).await {
            Ok(Some(value)) if value == stamp.as_bytes() => {
                if let Err(e) = self.store.expire(key, ttl).await {
                    warn!(%key, error = %e, "failed to bound possibly orphaned lock");
                }
            }
            Ok(_) => {}
            Err(e) => debug!(%key, error = %e, "could not check for orphaned lock"),
        }
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.delete(&[key.to_string()]).await {
            warn!(%key, error = %e, "failed to delete half-acquired lock");
        }
    }

    fn track(&self, key: &str) -> bool {
        let mut held = self.holders();
        if self.is_closed() {
            return false;
        }
        // Re-acquiring after our own TTL ran out must not track the key twice.
        if !held.iter().any(|k| k == key) {
            held.push(key.to_string());
        }
        drop(held);

        if !self.cleanup_armed.swap(true, Ordering::SeqCst) {
            debug!("shutdown cleanup armed");
        }
        true
    }

    // The holder list stays consistent even if a holder panicked mid-push.
    fn holders(&self) -> MutexGuard<'_, Vec<String>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        if self.is_closed() || !self.cleanup_armed.load(Ordering::SeqCst) {
            return;
        }
        let held = self.held.get_mut().unwrap_or_else(|e| e.into_inner());
        if !held.is_empty() {
            warn!(
                keys = ?held,
                "lock manager dropped without shutdown, locks persist until their TTL"
            );
        }
    }
}
