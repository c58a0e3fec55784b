//! The posting-list abstraction (spec §4.1): four directional queries,
//! bulk `next_n`, `length`/`count`, random access where supported, and
//! the visibility-related predicates. Every concrete list and every
//! algebraic operator implements this one trait, so the rest of the
//! engine never needs to know which kind of list it is driving.

pub mod array;
pub mod compressed;
pub mod copy;
pub mod empty;
pub mod one_element;
pub mod ordered_combination;
pub mod range;

use crate::core::offset::Offset;

/// Inclusive `(from, to)` extent, re-exported here under the name the
/// posting-list interface uses throughout spec §4.
pub type Extent = crate::core::offset::Extent;

/// Implementations must be monotone-friendly: repeated calls with a
/// non-decreasing probe `p` should run in amortised O(1) via an
/// internal cursor that advances with exponential-then-binary search,
/// never a linear rescan from the start of the list.
pub trait PostingList: Send {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent>;
    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent>;
    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent>;
    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent>;

    /// Appends up to `n` extents with `s >= from` and `e <= to`, in
    /// order, to `out`. Returns the number appended; fewer than `n`
    /// only means the list is exhausted within `[from, to]`.
    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize;

    fn length(&mut self) -> i64;
    fn count(&mut self, from: Offset, to: Offset) -> i64;
    fn get_nth(&mut self, i: i64) -> Option<Extent>;

    fn is_secure(&self) -> bool {
        false
    }
    fn is_almost_secure(&self) -> bool {
        false
    }

    /// True once a decode failure has killed this list for good (spec
    /// §7): every directional query then returns `None` exactly as an
    /// exhausted-but-healthy list would, so callers that care about the
    /// distinction must check this rather than infer it from `None`.
    fn is_poisoned(&self) -> bool {
        false
    }

    /// Hint to precompute or re-encode; a no-op unless a list kind has
    /// something worth doing eagerly.
    fn optimize(&mut self) {}
}

/// Shared helper for `next_n` default-style implementations that already
/// have a working `first_start_bigger_eq` cursor: walks forward extent by
/// extent. Concrete lists with faster bulk paths (array/compressed)
/// override `next_n` directly instead of using this.
pub(crate) fn next_n_via_first_start<L: PostingList + ?Sized>(
    list: &mut L,
    from: Offset,
    to: Offset,
    n: usize,
    out: &mut Vec<Extent>,
) -> usize {
    let mut produced = 0;
    let mut cursor = from;
    while produced < n {
        match list.first_start_bigger_eq(cursor) {
            Some(e) if e.to <= to => {
                out.push(e);
                cursor = e.from + 1;
                produced += 1;
            }
            _ => break,
        }
    }
    produced
}
