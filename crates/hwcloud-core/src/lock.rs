//! Per-resource serialization of mutating operations
//!
//! Orchestrations that target the same remote aggregate (for example two
//! resizes of one cluster) must not overlap. Each resource ID gets its own
//! lazily created async mutex; IDs never share a lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

static GLOBAL_LOCKS: LazyLock<LockTable> = LazyLock::new(LockTable::new);

/// Table of named locks keyed by resource ID
#[derive(Debug, Default)]
pub struct LockTable {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide lock table
    pub fn global() -> &'static LockTable {
        &GLOBAL_LOCKS
    }

    /// Get or create the lock for `resource_id`
    fn entry(&self, resource_id: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = locks.get(resource_id) {
                return Arc::clone(lock);
            }
        }

        // Another caller may have inserted between the read and write locks.
        let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(resource_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Wait for exclusive access to `resource_id`.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn lock(&self, resource_id: &str) -> ResourceGuard {
        let lock = self.entry(resource_id);
        tracing::debug!(resource_id, "Waiting for resource lock");
        let guard = lock.lock_owned().await;
        tracing::debug!(resource_id, "Acquired resource lock");
        ResourceGuard {
            resource_id: resource_id.to_string(),
            _guard: guard,
        }
    }

    /// Run `f` while holding the lock for `resource_id`
    pub async fn with_lock<F, Fut, T>(&self, resource_id: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock(resource_id).await;
        f().await
    }

    /// Number of resource IDs that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII guard for a resource lock
#[derive(Debug)]
pub struct ResourceGuard {
    resource_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl ResourceGuard {
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        tracing::debug!(resource_id = %self.resource_id, "Released resource lock");
    }
}
