//! Algebraic operators over posting lists (spec §4.3). Each operator is
//! itself a `PostingList`, so trees compose without a separate
//! "evaluate" pass.

pub mod and;
pub mod containment;
pub mod from_to;
pub mod or;
pub mod sequence;
