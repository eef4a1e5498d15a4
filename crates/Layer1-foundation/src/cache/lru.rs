//! Lightweight LRU cache
//!
//! Minimal implementation: a HashMap plus a monotonically increasing
//! access counter. Recency is updated on both reads and writes; eviction
//! removes the entry with the smallest access stamp.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, LruEntry<V>>,
    max_entries: usize,
    access_counter: u64,
}

#[derive(Debug)]
struct LruEntry<V> {
    value: V,
    last_access: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a new LRU cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            max_entries: capacity.max(1),
            access_counter: 0,
        }
    }

    /// Get a reference to a cached value, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.access_counter += 1;
        let counter = self.access_counter;
        self.entries.get_mut(key).map(|entry| {
            entry.last_access = counter;
            &entry.value
        })
    }

    /// Insert a value, evicting the least recently used entry at capacity
    ///
    /// Returns the displaced value when the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.access_counter += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            let old = std::mem::replace(&mut entry.value, value);
            entry.last_access = self.access_counter;
            return Some(old);
        }

        while self.entries.len() >= self.max_entries {
            self.evict_lru();
        }

        self.entries.insert(
            key,
            LruEntry {
                value,
                last_access: self.access_counter,
            },
        );
        None
    }

    /// Remove a specific key
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Keep only entries matching the predicate
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.entries.retain(|k, e| f(k, &e.value));
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Change the capacity, evicting down to the new size if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.max_entries = capacity.max(1);
        while self.entries.len() > self.max_entries {
            self.evict_lru();
        }
    }

    fn evict_lru(&mut self) {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access)
            .map(|(k, _)| k.clone());
        if let Some(key) = lru_key {
            self.entries.remove(&key);
        }
    }
}
