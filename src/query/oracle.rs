//! Statistics oracle (spec §6): `stats_for` is idempotent and safe to call
//! concurrently for the same key — the underlying cache (§4.4) guarantees
//! a stats pass for a given `(container, k1, b)` only ever runs once per
//! eviction cycle, with later callers reusing the `Arc`.

use std::sync::Arc;

use crate::cache::{FingerprintCache, Fingerprint};
use crate::scoring::stats::StatsEntry;

/// Identifies one collection-statistics computation: a container
/// fingerprint (which set of documents/segments) plus the BM25
/// parameters the impact table was built for (different `(k1, b)` pairs
/// need different tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatsKey {
    pub container_fingerprint: Fingerprint,
    k1_bits: u64,
    b_bits: u64,
}

impl StatsKey {
    pub fn new(container_fingerprint: Fingerprint, k1: f64, b: f64) -> Self {
        StatsKey { container_fingerprint, k1_bits: k1.to_bits(), b_bits: b.to_bits() }
    }

    fn cache_fingerprint(&self) -> Fingerprint {
        // Collapse the three-field key into the single u64 the generic
        // fingerprint cache is keyed by.
        self.container_fingerprint ^ self.k1_bits.rotate_left(21) ^ self.b_bits.rotate_left(43)
    }
}

pub trait StatisticsOracle: Send + Sync {
    /// Returns the cached stats entry for `key`, computing it via `build`
    /// on a miss. `build` is only ever invoked once per cache generation
    /// for a given key, even under concurrent callers.
    fn stats_for(&self, key: StatsKey, build: &mut dyn FnMut() -> StatsEntry) -> Arc<StatsEntry>;

    fn invalidate(&self, key: StatsKey);
}

pub struct CachingStatisticsOracle {
    cache: FingerprintCache<StatsEntry>,
}

impl CachingStatisticsOracle {
    pub fn new(capacity: usize) -> Self {
        CachingStatisticsOracle { cache: FingerprintCache::new(capacity) }
    }
}

impl StatisticsOracle for CachingStatisticsOracle {
    fn stats_for(&self, key: StatsKey, build: &mut dyn FnMut() -> StatsEntry) -> Arc<StatsEntry> {
        self.cache.get_or_insert_with(key.cache_fingerprint(), || build())
    }

    fn invalidate(&self, key: StatsKey) {
        self.cache.invalidate(key.cache_fingerprint());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;

    fn dummy_stats() -> StatsEntry {
        let config = EngineConfig::default();
        let mut containers = crate::postings::array::ArrayList::from_extents(&[crate::postings::Extent::new(0, 9)]);
        let mut elements: Vec<Box<dyn crate::postings::PostingList>> = vec![];
        crate::scoring::stats::compute_stats(&config, &mut containers, &mut elements).0
    }

    #[test]
    fn builds_once_per_key() {
        let oracle = CachingStatisticsOracle::new(4);
        let key = StatsKey::new(1, 1.2, 0.75);
        let calls = std::cell::Cell::new(0);
        let s1 = oracle.stats_for(key, &mut || {
            calls.set(calls.get() + 1);
            dummy_stats()
        });
        let s2 = oracle.stats_for(key, &mut || {
            calls.set(calls.get() + 1);
            dummy_stats()
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(s1.container_count, s2.container_count);
    }

    #[test]
    fn distinct_bm25_params_get_distinct_entries() {
        let oracle = CachingStatisticsOracle::new(4);
        let a = StatsKey::new(1, 1.2, 0.75);
        let b = StatsKey::new(1, 2.0, 0.5);
        assert_ne!(a.cache_fingerprint(), b.cache_fingerprint());
    }
}
