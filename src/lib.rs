pub mod cache;
pub mod compression;
pub mod core;
pub mod operators;
pub mod postings;
pub mod query;
pub mod scoring;
pub mod storage;
pub mod util;
pub mod visibility;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                          CORE ENGINE ARCHITECTURE                        │
│                                                                            │
│  query::driver::QueryDriver                                               │
│    ├─ owns/borrows an operator tree (postings::PostingList trait objects) │
│    │    built from operators::{And, Or, Sequence, Containment, FromTo}   │
│    │    over postings::{ArrayList, CompressedSegmentedList, ...}          │
│    ├─ wires a query::oracle::StatisticsOracle for collection stats,      │
│    │    backed by cache::FingerprintCache<StatsEntry>                    │
│    ├─ composes visibility::Security at the root unless flagged GOD        │
│    └─ drives scoring::bm25::Bm25Ranker over the (possibly restricted)     │
│         container list                                                    │
│                                                                            │
│  compression::* encodes/decodes the framed container (spec §3) that is   │
│  the only on-wire contract between storage::SegmentStore and the core.   │
└──────────────────────────────────────────────────────────────────────────┘
*/
