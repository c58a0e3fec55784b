//! Core-relevant tuning knobs (spec §4.5/§4.6/§9). Non-core ambient config
//! the teacher carried (WAL commit intervals, buffer pool sizes, reader-pool
//! sizing) is dropped — see DESIGN.md.

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// BM25 term-frequency saturation parameter.
    pub k1: f64,
    /// BM25 length-normalisation strength.
    pub b: f64,
    /// Whether to weight terms by IDF at all (§4.6 step 1).
    pub use_idf: bool,
    /// Whether to fold in term-proximity scoring (§4.6).
    pub use_proximity: bool,
    /// Proximity distance exponent `q` (default 1.5).
    pub proximity_q: f64,
    /// Number of terms the suckers heuristic may remove from the driving
    /// heap at once (spec §4.6 step 3, §9 open question: default 3).
    pub sucker_count: usize,
    /// Safety multiplier applied to a sucker's maximum remaining
    /// contribution before it is allowed to change the top-k (default 2.5).
    pub sucker_safety_factor: f64,
    /// Upper bound on `dl >> dl_shift` for which the impact table is cached.
    pub max_cached_shifted_dl: u32,
    /// Upper bound on the quantised TF code cached in the impact table.
    pub max_cached_tf: u32,
    /// Maximum number of postings per compressed segment block (§4.2).
    pub max_segment_size: usize,
    /// Below this many postings, `Sequence::optimize` materialises the
    /// phrase eagerly into a cached array list instead of leaving it lazy.
    pub compute_immediate_threshold: usize,
    /// Below this many elements, offset-array sort/dedup uses heap sort;
    /// at or above it, radix sort with 6-bit passes (spec §9 — tuning knob,
    /// not a contract; only the resulting order/dedup is).
    pub sort_hybrid_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            k1: 1.2,
            b: 0.75,
            use_idf: true,
            use_proximity: false,
            proximity_q: 1.5,
            sucker_count: 3,
            sucker_safety_factor: 2.5,
            max_cached_shifted_dl: 255,
            max_cached_tf: 255,
            max_segment_size: 32 * 1024,
            compute_immediate_threshold: 4096,
            sort_hybrid_threshold: 256,
        }
    }
}

impl EngineConfig {
    pub fn with_bm25_params(mut self, k1: f64, b: f64) -> Self {
        self.k1 = k1;
        self.b = b;
        self
    }
}
