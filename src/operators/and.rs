//! Conjunction over N children (spec §4.3): `AND(L1,…,Ln)` is the set of
//! *minimal* extents `[min_i from_i, max_i to_i]` choosing one occurrence
//! `from each Li` such that no other choice yields a strictly smaller
//! (properly contained) extent. This is the passage-level conjunction the
//! original engine builds its "minimal passage containing all query
//! terms" statistics on (`qap2query.cpp`) — it does not require the
//! children to share a start position; `Containment` is what narrows
//! these passages down to whichever container (e.g. a document) happens
//! to enclose one of them.
//!
//! `first_start_bigger_eq(p)` finds the earliest such minimal window:
//! seed one candidate occurrence per child at or after `p`, then
//! repeatedly try to advance the child currently holding the smallest
//! `from` to a later occurrence of its own — accepting the advance only
//! if it still fits inside the current `max_end`, since that's the only
//! move that can shrink the window without enlarging it. The loop
//! terminates because the advanced child's `from` strictly increases on
//! each acceptance and is always bounded by `max_end`.

use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};

pub struct And {
    children: Vec<Box<dyn PostingList>>,
}

impl And {
    pub fn new(children: Vec<Box<dyn PostingList>>) -> Self {
        assert!(!children.is_empty(), "And requires at least one child");
        And { children }
    }

    fn align_from(&mut self, p: Offset) -> Option<Extent> {
        let mut cand: Vec<Extent> = Vec::with_capacity(self.children.len());
        for child in &mut self.children {
            cand.push(child.first_start_bigger_eq(p)?);
        }
        loop {
            let min_start = cand.iter().map(|e| e.from).min().unwrap();
            let max_end = cand.iter().map(|e| e.to).max().unwrap();
            let idx = cand.iter().position(|e| e.from == min_start).unwrap();
            match self.children[idx].first_start_bigger_eq(cand[idx].from + 1) {
                Some(next) if next.from <= max_end && next.to <= max_end => {
                    cand[idx] = next;
                }
                _ => return Some(Extent::new(min_start, max_end)),
            }
        }
    }
}

impl PostingList for And {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.align_from(p)
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = Offset::MIN + 1;
        loop {
            let e = self.align_from(cursor)?;
            if e.to >= p {
                return Some(e);
            }
            cursor = e.from + 1;
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut best: Option<Extent> = None;
        let mut cursor = Offset::MIN + 1;
        loop {
            match self.align_from(cursor) {
                Some(e) if e.from <= p => {
                    best = Some(e);
                    cursor = e.from + 1;
                }
                _ => break,
            }
        }
        best
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut best: Option<Extent> = None;
        let mut cursor = Offset::MIN + 1;
        loop {
            match self.align_from(cursor) {
                Some(e) if e.to <= p => {
                    best = Some(e);
                    cursor = e.from + 1;
                }
                Some(e) => {
                    cursor = e.from + 1;
                    continue;
                }
                None => break,
            }
        }
        best
    }

    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        let mut produced = 0;
        let mut cursor = from;
        while produced < n {
            match self.align_from(cursor) {
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

    #[test]
    fn combines_nearest_occurrences_into_a_minimal_window() {
        let a = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(14, 14)]);
        let b = ArrayList::from_extents(&[Extent::new(6, 6), Extent::new(20, 20)]);
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(and.first_start_bigger_eq(0), Some(Extent::new(5, 6)));
    }

    #[test]
    fn same_start_children_collapse_to_their_shared_span() {
        let a = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(10, 10), Extent::new(20, 21)]);
        let b = ArrayList::from_extents(&[Extent::new(5, 6), Extent::new(20, 20)]);
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(and.first_start_bigger_eq(0), Some(Extent::new(5, 6)));
        assert_eq!(and.first_start_bigger_eq(7), Some(Extent::new(20, 21)));
    }

    #[test]
    fn any_exhausted_child_makes_the_whole_thing_empty() {
        let a = ArrayList::from_extents(&[Extent::new(1, 1)]);
        let b = ArrayList::from_extents(&[]);
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(and.length(), 0);
    }

    #[test]
    fn containment_recovers_only_documents_holding_every_term() {
        use crate::operators::containment::{Containment, Direction};

        let docs = [Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29), Extent::new(30, 39)];
        let a = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(14, 14), Extent::new(25, 25), Extent::new(36, 36)]);
        let b = ArrayList::from_extents(&[Extent::new(6, 6), Extent::new(20, 20), Extent::new(35, 35)]);
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);

        let mut windows = Vec::new();
        let mut pos = 0;
        while let Some(e) = and.first_start_bigger_eq(pos) {
            windows.push(e);
            pos = e.from + 1;
        }

        let mut containment = Containment::new(
            Box::new(ArrayList::from_extents(&docs)),
            Box::new(ArrayList::from_extents(&windows)),
            Direction::Contains,
            false,
        );
        let mut found = Vec::new();
        let mut pos = 0;
        while let Some(e) = containment.first_start_bigger_eq(pos) {
            found.push((e.from, e.to));
            pos = e.from + 1;
        }
        assert_eq!(found, vec![(0, 9), (20, 29), (30, 39)]);
    }
}
