//! Index cache (spec §4.4): materialised posting lists and collection
//! statistics entries are expensive to rebuild (decompressing whole
//! segments, walking every document to compute an impact table), so both
//! are kept behind one fingerprint-keyed LRU, reference-counted so
//! concurrent queries share a hit instead of each decompressing their own
//! copy. Grounded on the teacher's `query::cache::QueryCache` (same
//! `lru` + hit/miss-counter shape) generalised to a fingerprint key
//! instead of a literal query string, since here the cache key is a
//! content fingerprint of a term or container, not the user's query text.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::postings::Extent;

/// A content fingerprint identifying the cached value: a term id, a
/// container id, or a hash of a compound expression, combined with
/// whatever scoring parameters the cached value depends on (e.g.
/// `(k1, b)` for a stats entry).
pub type Fingerprint = u64;

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Generic fingerprint-keyed LRU, single lock, reference-counted values.
pub struct FingerprintCache<V> {
    cache: Mutex<LruCache<Fingerprint, Arc<V>>>,
    capacity: usize,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl<V> FingerprintCache<V> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        FingerprintCache {
            cache: Mutex::new(LruCache::new(cap)),
            capacity,
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: Fingerprint) -> Option<Arc<V>> {
        let mut cache = self.cache.lock();
        if let Some(v) = cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            Some(v.clone())
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Returns the cached value, computing and inserting it via `build`
    /// only on a miss. `build` may be expensive (decompression, a full
    /// collection-statistics pass); it never runs twice for the same key
    /// while holding the lock across the call, so concurrent callers with
    /// distinct keys don't block each other longer than one map access.
    pub fn get_or_insert_with(&self, key: Fingerprint, build: impl FnOnce() -> V) -> Arc<V> {
        if let Some(v) = self.get(key) {
            return v;
        }
        let value = Arc::new(build());
        let mut cache = self.cache.lock();
        cache.put(key, value.clone());
        value
    }

    pub fn invalidate(&self, key: Fingerprint) {
        self.cache.lock().pop(&key);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }
}

/// A cached materialised posting list: decompressed once into a plain
/// extent vector so cheap `ArrayList` wrappers can be handed out per
/// query without repeating the decode.
pub type CachedExtents = FingerprintCache<Vec<Extent>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_after_first_insert() {
        let cache: FingerprintCache<Vec<Extent>> = FingerprintCache::new(4);
        let built = std::cell::Cell::new(0);
        let v1 = cache.get_or_insert_with(1, || {
            built.set(built.get() + 1);
            vec![Extent::new(0, 0)]
        });
        let v2 = cache.get_or_insert_with(1, || {
            built.set(built.get() + 1);
            vec![Extent::new(9, 9)]
        });
        assert_eq!(built.get(), 1);
        assert_eq!(v1, v2);
        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache: FingerprintCache<Vec<Extent>> = FingerprintCache::new(2);
        cache.get_or_insert_with(1, || vec![Extent::new(1, 1)]);
        cache.get_or_insert_with(2, || vec![Extent::new(2, 2)]);
        cache.get_or_insert_with(3, || vec![Extent::new(3, 3)]);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let cache: FingerprintCache<Vec<Extent>> = FingerprintCache::new(4);
        cache.get_or_insert_with(1, || vec![Extent::new(1, 1)]);
        cache.invalidate(1);
        let built = std::cell::Cell::new(0);
        cache.get_or_insert_with(1, || {
            built.set(built.get() + 1);
            vec![Extent::new(2, 2)]
        });
        assert_eq!(built.get(), 1);
    }
}
