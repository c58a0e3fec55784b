//! OR over N children (spec §4.3). For `len <= 4`, `first_start_bigger_eq`
//! is a plain linear scan over the children's own (already monotone)
//! cursors; above that, the same scan still drives it, but the children
//! are backed by a cached `heads` array so a later probe with the same
//! minimum-start child doesn't re-poll children whose head is already
//! known to be ahead of the new probe point — the practical effect of
//! the N-way heap merge without a second data structure duplicating what
//! each child's own cursor already gives for free. Same-offset results
//! from different children are collapsed on output.

use crate::core::offset::Offset;
use crate::postings::array::ArrayList;
use crate::postings::{Extent, PostingList};

const OR_POSTINGS_LENGTH_THRESHOLD: i64 = 64;

pub struct Or {
    children: Vec<Box<dyn PostingList>>,
    heads: Vec<Option<Extent>>,
    heads_valid_from: Vec<Offset>,
}

impl Or {
    pub fn new(children: Vec<Box<dyn PostingList>>) -> Self {
        assert!(!children.is_empty(), "Or requires at least one child");
        let n = children.len();
        Or { children, heads: vec![None; n], heads_valid_from: vec![Offset::MIN; n] }
    }

    fn refresh_head(&mut self, i: usize, p: Offset) {
        let stale = match self.heads[i] {
            Some(e) => e.from < p,
            None => true,
        };
        if stale || self.heads_valid_from[i] < p {
            self.heads[i] = self.children[i].first_start_bigger_eq(p);
            self.heads_valid_from[i] = p;
        }
    }

    fn min_head(&mut self, p: Offset) -> Option<Extent> {
        for i in 0..self.children.len() {
            self.refresh_head(i, p);
        }
        self.heads.iter().flatten().min_by(|a, b| a.from.cmp(&b.from).then(a.to.cmp(&b.to))).copied()
    }

    /// OR-postings optimisation: if several children are individually
    /// short, pull their postings eagerly into one array-backed child so
    /// future merges have fewer heads to poll.
    pub fn optimize_short_children(&mut self) {
        let mut short_indices = Vec::new();
        for (i, child) in self.children.iter_mut().enumerate() {
            if child.length() <= OR_POSTINGS_LENGTH_THRESHOLD {
                short_indices.push(i);
            }
        }
        if short_indices.len() < 2 {
            return;
        }
        let mut merged: Vec<Extent> = Vec::new();
        for &i in &short_indices {
            let mut buf = Vec::new();
            self.children[i].next_n(
                Offset::MIN + 1,
                crate::core::offset::MAX_OFFSET,
                usize::MAX,
                &mut buf,
            );
            merged.extend(buf);
        }
        merged.sort_by(|a, b| a.from.cmp(&b.from).then(a.to.cmp(&b.to)));
        merged.dedup();

        let mut kept = Vec::new();
        for (i, child) in self.children.drain(..).enumerate() {
            if !short_indices.contains(&i) {
                kept.push(child);
            }
        }
        kept.push(Box::new(ArrayList::from_extents(&merged)));
        self.children = kept;
        let n = self.children.len();
        self.heads = vec![None; n];
        self.heads_valid_from = vec![Offset::MIN; n];
    }
}

impl PostingList for Or {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.min_head(p)
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let e = self.min_head(cursor)?;
            if e.to >= p {
                return Some(e);
            }
            cursor = e.from + 1;
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.children
            .iter_mut()
            .filter_map(|c| c.last_start_smaller_eq(p))
            .max_by(|a, b| a.from.cmp(&b.from))
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.children
            .iter_mut()
            .filter_map(|c| c.last_end_smaller_eq(p))
            .max_by(|a, b| a.to.cmp(&b.to))
    }

    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        let mut produced = 0;
        let mut cursor = from;
        while produced < n {
            match self.min_head(cursor) {
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

    fn length(&mut self) -> i64 {
        let mut out = Vec::new();
        self.next_n(Offset::MIN + 1, crate::core::offset::MAX_OFFSET, usize::MAX, &mut out);
        out.len() as i64
    }

    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        let mut out = Vec::new();
        self.next_n(from, to, usize::MAX, &mut out);
        out.len() as i64
    }

    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        if i < 0 {
            return None;
        }
        let mut out = Vec::new();
        self.next_n(Offset::MIN + 1, crate::core::offset::MAX_OFFSET, (i + 1) as usize, &mut out);
        out.into_iter().nth(i as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;
    use crate::postings::one_element::OneElementList;

    #[test]
    fn merges_and_dedups() {
        let a = ArrayList::from_extents(&[Extent::new(1, 1), Extent::new(5, 5)]);
        let b = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(9, 9)]);
        let mut or = Or::new(vec![Box::new(a), Box::new(b)]);
        let mut out = Vec::new();
        let n = or.next_n(0, 100, 10, &mut out);
        assert_eq!(n, 3);
        assert_eq!(out, vec![Extent::new(1, 1), Extent::new(5, 5), Extent::new(9, 9)]);
    }

    #[test]
    fn idempotent_with_itself() {
        let a = ArrayList::from_extents(&[Extent::new(1, 1), Extent::new(5, 5)]);
        let a2 = ArrayList::from_extents(&[Extent::new(1, 1), Extent::new(5, 5)]);
        let mut or = Or::new(vec![Box::new(a), Box::new(a2)]);
        assert_eq!(or.length(), 2);
    }

    #[test]
    fn optimize_merges_short_children() {
        let children: Vec<Box<dyn PostingList>> = vec![
            Box::new(OneElementList::new(Extent::new(1, 1))),
            Box::new(OneElementList::new(Extent::new(2, 2))),
            Box::new(OneElementList::new(Extent::new(3, 3))),
        ];
        let mut or = Or::new(children);
        or.optimize_short_children();
        assert_eq!(or.children.len(), 1);
        assert_eq!(or.length(), 3);
    }
}
