pub mod bm25;
pub mod stats;

pub use bm25::{Bm25Ranker, ScoredExtent, TermElement};
pub use stats::{compute_stats, StatsEntry};
