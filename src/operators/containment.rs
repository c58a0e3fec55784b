//! Containment operator (spec §4.3): `A ⊐ B` yields the extents of `A`
//! that contain some extent of `B`; `A ⊏ B` swaps the roles. Either
//! direction can be negated (emit the extents of `A` that do *not*
//! satisfy the relation instead). Implemented by advancing both lists in
//! lockstep using only the directional primitives of each side — this is
//! also how the visibility filter restricts any operator tree
//! (`Security(visible)` plays the role of `A` or `B` depending on
//! direction).

use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `A` is the container, `B` is the containee: keep `A` extents that
    /// contain a `B` extent.
    Contains,
    /// `A` is the containee, `B` is the container: keep `A` extents that
    /// are contained by a `B` extent.
    ContainedBy,
}

pub struct Containment {
    a: Box<dyn PostingList>,
    b: Box<dyn PostingList>,
    direction: Direction,
    negate: bool,
}

impl Containment {
    pub fn new(a: Box<dyn PostingList>, b: Box<dyn PostingList>, direction: Direction, negate: bool) -> Self {
        Containment { a, b, direction, negate }
    }

    fn satisfies(&mut self, candidate: Extent) -> bool {
        let found = match self.direction {
            Direction::Contains => {
                // does some B extent fall inside `candidate`?
                match self.b.first_start_bigger_eq(candidate.from) {
                    Some(e) => e.from <= candidate.to && e.to <= candidate.to,
                    None => false,
                }
            }
            Direction::ContainedBy => {
                // does some B extent contain `candidate`?
                match self.b.last_start_smaller_eq(candidate.from) {
                    Some(e) => e.to >= candidate.to,
                    None => false,
                }
            }
        };
        found != self.negate
    }
}

impl PostingList for Containment {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let candidate = self.a.first_start_bigger_eq(cursor)?;
            if self.satisfies(candidate) {
                return Some(candidate);
            }
            cursor = candidate.from + 1;
        }
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let candidate = self.a.first_end_bigger_eq(cursor)?;
            if self.satisfies(candidate) {
                return Some(candidate);
            }
            cursor = candidate.to + 1;
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let candidate = self.a.last_start_smaller_eq(cursor)?;
            if self.satisfies(candidate) {
                return Some(candidate);
            }
            if candidate.from == Offset::MIN {
                return None;
            }
            cursor = candidate.from - 1;
        }
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let candidate = self.a.last_end_smaller_eq(cursor)?;
            if self.satisfies(candidate) {
                return Some(candidate);
            }
            if candidate.to == Offset::MIN {
                return None;
            }
            cursor = candidate.to - 1;
        }
    }

    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        let mut produced = 0;
        let mut cursor = from;
        while produced < n {
            match self.first_start_bigger_eq(cursor) {
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
    fn keeps_containers_that_hold_a_containee() {
        let docs = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29)]);
        let hits = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(25, 25)]);
        let mut c = Containment::new(Box::new(docs), Box::new(hits), Direction::Contains, false);
        let mut out = Vec::new();
        c.next_n(0, 100, 10, &mut out);
        assert_eq!(out, vec![Extent::new(0, 9), Extent::new(20, 29)]);
    }

    #[test]
    fn antisymmetry_with_negation() {
        let docs = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29)]);
        let hits = ArrayList::from_extents(&[Extent::new(5, 5)]);
        let docs2 = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29)]);
        let hits2 = ArrayList::from_extents(&[Extent::new(5, 5)]);
        let mut pos = Containment::new(Box::new(docs), Box::new(hits), Direction::Contains, false);
        let mut neg = Containment::new(Box::new(docs2), Box::new(hits2), Direction::Contains, true);
        assert_eq!(pos.length() + neg.length(), 3);
    }
}
