//! Single-flight de-duplication
//!
//! Prevents concurrent callers with the same cache fingerprint from each
//! invoking the underlying tool: the first caller holds the per-key
//! guard while it executes, laggards wait and then re-check the cache.
//! Best-effort only - no at-most-once guarantee is promised.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use toolgate_foundation::CacheKey;

/// Per-fingerprint execution guards
#[derive(Debug, Default)]
pub struct SingleFlight {
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for a fingerprint, waiting out any holder
    ///
    /// Idle entries (held by nobody but the map) are pruned on the way
    /// in, so the map stays bounded by the number of keys actually in
    /// flight.
    pub async fn guard(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.retain(|_, l| Arc::strong_count(l) > 1);
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked (idle entries included)
    pub async fn len(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
