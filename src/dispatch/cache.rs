//! Capacity- and time-bounded lookup caches.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A thread-safe LRU cache whose entries also expire after a fixed TTL.
///
/// Built with a capacity of zero, the cache is disabled: inserts are
/// dropped and every lookup misses.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    inner: Option<Mutex<LruCache<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Clone out a live entry, evicting it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.as_ref()?.lock();
        let expired = match cache.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(key);
        }
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; the least recently used entry goes when full.
    pub fn insert(&self, key: K, value: V) {
        if let Some(cache) = &self.inner {
            cache.lock().put(key, self.entry(value));
        }
    }

    /// Replace the entry for `key` with `f(current)` under one lock.
    /// `current` is `None` when the key is absent or expired.
    pub fn update<F>(&self, key: K, f: F)
    where
        F: FnOnce(Option<V>) -> V,
    {
        if let Some(cache) = &self.inner {
            let mut cache = cache.lock();
            let now = Instant::now();
            let current = cache
                .pop(&key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.value);
            let entry = self.entry(f(current));
            cache.put(key, entry);
        }
    }

    fn entry(&self, value: V) -> Entry<V> {
        Entry {
            value,
            expires_at: Instant::now().checked_add(self.ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| cache.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.lock().clear();
        }
    }
}
