//! Tool Result Cache
//!
//! Maps an invocation fingerprint (tool name + canonical parameters) to a
//! previously computed result, with per-entry TTL and LRU eviction.
//! Failed results are never stored, so a transient tool failure cannot be
//! memoized. The cache is an optimization, not a correctness dependency:
//! every operation is infallible and consumers must tolerate a miss at
//! any time.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::key::CacheKey;
use crate::cache::lru::LruCache;
use crate::core::ToolResult;

/// Default time-to-live for stored entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum entry count
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug)]
struct CacheEntry {
    value: ToolResult,
    created_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}

/// Shared, thread-safe result cache
///
/// Interior mutability behind a short-lived mutex: no lock is ever held
/// across an await point, so concurrent dispatches observe either a fully
/// written entry or a miss.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<Inner>,
}

impl ResultCache {
    /// Create a cache with default policy (300s TTL, 1000 entries)
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with an explicit TTL and capacity
    pub fn with_policy(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(max_entries),
                default_ttl: ttl,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a cached result
    ///
    /// A logically expired entry counts as a miss and is purged. A hit
    /// marks the entry most recently used.
    pub fn lookup(&self, tool_name: &str, params: &Value) -> Option<ToolResult> {
        let key = CacheKey::new(tool_name, params);
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(&key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                inner.hits += 1;
                trace!(tool = tool_name, "cache hit");
                return Some(entry.value.clone());
            }
            None => false,
        };

        if expired {
            inner.entries.remove(&key);
            debug!(tool = tool_name, "cache entry expired");
        }
        inner.misses += 1;
        None
    }

    /// Store a successful result with the configured default TTL
    pub fn store(&self, tool_name: &str, params: &Value, result: &ToolResult) {
        let ttl = self.inner.lock().default_ttl;
        self.store_with_ttl(tool_name, params, result, ttl);
    }

    /// Store a successful result with an explicit TTL
    ///
    /// Failed results are silently ignored: they must never be visible
    /// through the cache.
    pub fn store_with_ttl(
        &self,
        tool_name: &str,
        params: &Value,
        result: &ToolResult,
        ttl: Duration,
    ) {
        if !result.success {
            debug!(tool = tool_name, "not caching failed result");
            return;
        }

        let key = CacheKey::new(tool_name, params);
        let now = Instant::now();
        let entry = CacheEntry {
            value: result.clone(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut inner = self.inner.lock();
        inner.entries.insert(key, entry);
        trace!(tool = tool_name, ttl_secs = ttl.as_secs(), "cache store");
    }

    /// Remove one entry by fingerprint
    pub fn invalidate(&self, tool_name: &str, params: &Value) {
        let key = CacheKey::new(tool_name, params);
        self.inner.lock().entries.remove(&key);
    }

    /// Empty all entries (counters are preserved)
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        debug!("cache cleared");
    }

    /// Update policy for subsequently stored entries
    ///
    /// Existing entries keep their original expiry; shrinking the
    /// capacity evicts least recently used entries down to the new size.
    pub fn configure(&self, ttl: Duration, max_entries: usize) {
        let mut inner = self.inner.lock();
        inner.default_ttl = ttl;
        inner.entries.set_capacity(max_entries);
    }

    /// Drop every expired entry (periodic housekeeping)
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired(now));
        before - inner.entries.len()
    }

    /// Observability snapshot
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            capacity: inner.entries.capacity(),
            hit_rate: if total > 0 {
                inner.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Age of the live entry for a fingerprint, if any
    pub fn entry_age(&self, tool_name: &str, params: &Value) -> Option<Duration> {
        let key = CacheKey::new(tool_name, params);
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner
            .entries
            .get(&key)
            .filter(|e| !e.is_expired(now))
            .map(|e| now.duration_since(e.created_at))
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss_then_hit() {
        let cache = ResultCache::new();
        let params = json!({"message": "hi"});

        assert!(cache.lookup("echo", &params).is_none());

        cache.store("echo", &params, &ToolResult::ok(json!({"echoed": "hi"})));
        let hit = cache.lookup("echo", &params).expect("should hit");
        assert_eq!(hit.data, Some(json!({"echoed": "hi"})));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let cache = ResultCache::new();
        cache.store(
            "weather",
            &json!({"city": "Oslo", "units": "metric"}),
            &ToolResult::ok(json!({"temp": 3})),
        );
        assert!(cache
            .lookup("weather", &json!({"units": "metric", "city": "Oslo"}))
            .is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ResultCache::with_policy(Duration::from_millis(20), 10);
        let params = json!({"message": "hi"});
        cache.store("echo", &params, &ToolResult::ok(json!("ok")));

        assert!(cache.lookup("echo", &params).is_some());
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.lookup("echo", &params).is_none());
        // Lazy purge removed the entry
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_failed_results_never_cached() {
        let cache = ResultCache::new();
        let params = json!({"url": "http://example.com"});

        cache.store("http_request", &params, &ToolResult::fail("connect refused"));
        assert!(cache.lookup("http_request", &params).is_none());

        // A later success overwrites cleanly
        cache.store("http_request", &params, &ToolResult::ok(json!({"status": 200})));
        let hit = cache.lookup("http_request", &params).expect("hit");
        assert!(hit.success);
    }

    #[test]
    fn test_lru_eviction_on_overflow() {
        let cache = ResultCache::with_policy(Duration::from_secs(60), 2);
        cache.store("echo", &json!({"n": 1}), &ToolResult::ok(json!(1)));
        cache.store("echo", &json!({"n": 2}), &ToolResult::ok(json!(2)));

        // Touch entry 1 so entry 2 is least recently used
        cache.lookup("echo", &json!({"n": 1}));
        cache.store("echo", &json!({"n": 3}), &ToolResult::ok(json!(3)));

        assert!(cache.lookup("echo", &json!({"n": 1})).is_some());
        assert!(cache.lookup("echo", &json!({"n": 2})).is_none());
        assert!(cache.lookup("echo", &json!({"n": 3})).is_some());
    }

    #[test]
    fn test_configure_does_not_rewrite_existing_ttls() {
        let cache = ResultCache::with_policy(Duration::from_millis(20), 10);
        let params = json!({"message": "hi"});
        cache.store("echo", &params, &ToolResult::ok(json!("ok")));

        // Raising the TTL must not resurrect the already-stored entry
        cache.configure(Duration::from_secs(60), 10);
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.lookup("echo", &params).is_none());
    }

    #[test]
    fn test_stats_counters() {
        let cache = ResultCache::new();
        let params = json!({"message": "hi"});

        cache.lookup("echo", &params); // miss
        cache.store("echo", &params, &ToolResult::ok(json!("ok")));
        cache.lookup("echo", &params); // hit
        cache.lookup("echo", &params); // hit

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_entry_age() {
        let cache = ResultCache::new();
        let params = json!({"message": "hi"});

        assert!(cache.entry_age("echo", &params).is_none());
        cache.store("echo", &params, &ToolResult::ok(json!("ok")));
        std::thread::sleep(Duration::from_millis(10));
        let age = cache.entry_age("echo", &params).expect("entry present");
        assert!(age >= Duration::from_millis(10));
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = ResultCache::new();
        let params = json!({"message": "hi"});
        cache.store("echo", &params, &ToolResult::ok(json!("ok")));
        cache.lookup("echo", &params);
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 1);
    }
}
