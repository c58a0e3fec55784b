//! Visibility / security filter (spec §4.7). A `VisibleExtentsTable` is a
//! sorted, reference-counted array of the extents one user may read;
//! `Security` wraps it as an ordinary `PostingList` (exponential-then-
//! binary cursor on `start_offset`/`end_offset`, same algorithmic shape
//! as the array list's own cursor), so it composes with the rest of the
//! operator algebra through plain `Containment` rather than a special
//! case: `restrict(visible, tree) = Containment(Security(visible), tree, ⊐)`.

use crate::core::offset::Offset;
use crate::operators::containment::{Containment, Direction};
use crate::postings::{Extent, PostingList};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Text,
    Binary,
    Structured,
}

#[derive(Debug, Clone, Copy)]
pub struct VisibleEntry {
    pub file_id: u64,
    pub start_offset: Offset,
    pub token_count: i64,
    pub document_type: DocumentType,
}

impl VisibleEntry {
    pub fn end_offset(&self) -> Offset {
        self.start_offset + self.token_count - 1
    }
}

/// Sorted ascending by `start_offset`. Shared via `Arc` so concurrent
/// queries for the same user reuse one table (spec §5: "reference
/// counted so concurrent queries share it").
pub struct VisibleExtentsTable {
    entries: Vec<VisibleEntry>,
}

impl VisibleExtentsTable {
    pub fn new(mut entries: Vec<VisibleEntry>) -> Arc<Self> {
        entries.sort_by_key(|e| e.start_offset);
        Arc::new(VisibleExtentsTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A `PostingList` over a `VisibleExtentsTable`'s entries, each exposed
/// as the extent `(start_offset, end_offset)`.
pub struct Security {
    table: Arc<VisibleExtentsTable>,
    fwd_cursor: usize,
    bwd_cursor: usize,
}

impl Security {
    pub fn new(table: Arc<VisibleExtentsTable>) -> Self {
        let bwd_cursor = table.entries.len().saturating_sub(1);
        Security { table, fwd_cursor: 0, bwd_cursor }
    }

    fn at(&self, i: usize) -> Extent {
        let e = &self.table.entries[i];
        Extent::new(e.start_offset, e.end_offset())
    }

    fn exp_search_first_ge(&self, target: Offset, hint: usize) -> usize {
        let n = self.table.entries.len();
        if n == 0 {
            return 0;
        }
        let start = hint.min(n - 1);
        let key = |i: usize| self.table.entries[i].start_offset;
        if key(start) >= target {
            let mut step = 1usize;
            let mut lo = start;
            while lo > 0 && key(lo.saturating_sub(step)) >= target {
                lo = lo.saturating_sub(step);
                step *= 2;
            }
            let lo = lo.saturating_sub(step);
            return lo + (lo..=start).take_while(|&i| key(i) < target).count();
        }
        let mut step = 1usize;
        let mut hi = start;
        while hi < n && key(hi) < target {
            hi = (hi + step).min(n);
            if hi == n {
                break;
            }
            step *= 2;
        }
        let hi = hi.min(n);
        start + (start..hi).take_while(|&i| key(i) < target).count()
    }
}

impl PostingList for Security {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let i = self.exp_search_first_ge(p, self.fwd_cursor);
        if i >= self.table.entries.len() {
            return None;
        }
        self.fwd_cursor = i;
        Some(self.at(i))
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        // end_offset is monotone with start_offset since entries don't
        // overlap in a well-formed table, so the same search suffices.
        let mut i = self.fwd_cursor.min(self.table.entries.len().saturating_sub(1));
        while i < self.table.entries.len() && self.table.entries[i].end_offset() < p {
            i += 1;
        }
        if i >= self.table.entries.len() {
            return None;
        }
        self.fwd_cursor = i;
        Some(self.at(i))
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let first_gt = self.exp_search_first_ge(p + 1, self.bwd_cursor);
        if first_gt == 0 {
            return None;
        }
        self.bwd_cursor = first_gt - 1;
        Some(self.at(first_gt - 1))
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut best = None;
        for i in 0..self.table.entries.len() {
            if self.table.entries[i].end_offset() <= p {
                best = Some(i);
            } else {
                break;
            }
        }
        best.map(|i| self.at(i))
    }

    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        let mut i = self.exp_search_first_ge(from, self.fwd_cursor);
        let mut produced = 0;
        while produced < n && i < self.table.entries.len() {
            let e = self.at(i);
            if e.to > to {
                break;
            }
            out.push(e);
            i += 1;
            produced += 1;
        }
        self.fwd_cursor = i.min(self.table.entries.len().saturating_sub(1));
        produced
    }

    fn length(&mut self) -> i64 {
        self.table.entries.len() as i64
    }

    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        let mut out = Vec::new();
        self.next_n(from, to, usize::MAX, &mut out);
        out.len() as i64
    }

    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        if i < 0 || i as usize >= self.table.entries.len() {
            None
        } else {
            Some(self.at(i as usize))
        }
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// `visible.restrict(tree) = Containment(Security(visible), tree, ⊐)`:
/// the canonical way any operator tree is made user-visible-only. The
/// visibility wrapper is always the outermost node, and containment is
/// evaluated unconditionally, so a bug deeper in the tree can never leak
/// extents outside `visible` (spec §7).
pub fn restrict(visible: Arc<VisibleExtentsTable>, tree: Box<dyn PostingList>) -> Containment {
    Containment::new(Box::new(Security::new(visible)), tree, Direction::Contains, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<VisibleExtentsTable> {
        VisibleExtentsTable::new(vec![
            VisibleEntry { file_id: 0, start_offset: 0, token_count: 10, document_type: DocumentType::Text },
            VisibleEntry { file_id: 2, start_offset: 20, token_count: 10, document_type: DocumentType::Text },
        ])
    }

    #[test]
    fn security_exposes_visible_ranges_as_extents() {
        let mut sec = Security::new(table());
        assert_eq!(sec.first_start_bigger_eq(0), Some(Extent::new(0, 9)));
        assert_eq!(sec.first_start_bigger_eq(11), Some(Extent::new(20, 29)));
        assert_eq!(sec.first_start_bigger_eq(30), None);
    }

    #[test]
    fn restrict_filters_out_forbidden_extents() {
        use crate::postings::array::ArrayList;
        let hits = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(15, 15), Extent::new(25, 25)]);
        let mut restricted = restrict(table(), Box::new(hits));
        let mut out = Vec::new();
        restricted.next_n(0, 100, 10, &mut out);
        assert_eq!(out, vec![Extent::new(5, 5), Extent::new(25, 25)]);
    }
}
