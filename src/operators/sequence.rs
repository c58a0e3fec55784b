//! Sequence / phrase operator (spec §4.3): children `C0..Ck-1` match when
//! there exist adjacent extents `e0..ek-1`, one per child, with
//! `ei.from == e(i-1).to + 1`. The driving loop walks the children left
//! to right; whenever a child's returned extent starts later than
//! expected, the whole attempt restarts from a recomputed anchor rather
//! than stepping one child at a time, matching the source's
//! restart-from-anchor behaviour instead of a naive re-scan.
//!
//! `optimize()` collapses the operator into a precomputed `ArrayList`
//! when an operand is empty (the whole sequence is then empty) or the
//! list is small enough to eagerly materialise, so later queries avoid
//! repeating the alignment loop.

use crate::core::offset::Offset;
use crate::postings::array::ArrayList;
use crate::postings::{Extent, PostingList};

const PRECOMPUTE_THRESHOLD: i64 = 4096;

enum State {
    Children(Vec<Box<dyn PostingList>>),
    Precomputed(ArrayList),
}

pub struct Sequence {
    state: State,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn PostingList>>) -> Self {
        assert!(!children.is_empty(), "Sequence requires at least one child");
        Sequence { state: State::Children(children) }
    }

    fn try_align(children: &mut [Box<dyn PostingList>], start_pos: Offset) -> Option<Extent> {
        let k = children.len();
        let mut pos = start_pos;
        loop {
            let mut parts: Vec<Extent> = Vec::with_capacity(k);
            let mut restart: Option<Offset> = None;
            for (i, child) in children.iter_mut().enumerate() {
                let want = if i == 0 { pos } else { parts[i - 1].to + 1 };
                let e = child.first_start_bigger_eq(want)?;
                if e.from != want {
                    // Re-anchor so child 0 would need to start exactly
                    // `i` positions before this child's actual start,
                    // assuming unit-length tokens between adjacent
                    // children (the common word-level phrase case).
                    restart = Some(e.from - i as Offset);
                    break;
                }
                parts.push(e);
            }
            match restart {
                Some(new_pos) => {
                    if new_pos <= pos {
                        // Guard against non-termination on pathological
                        // inputs; treat as exhausted.
                        pos += 1;
                    } else {
                        pos = new_pos;
                    }
                }
                None => {
                    let first = parts[0];
                    let last = *parts.last().unwrap();
                    return Some(Extent::new(first.from, last.to));
                }
            }
        }
    }
}

impl PostingList for Sequence {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        match &mut self.state {
            State::Children(children) => Self::try_align(children, p),
            State::Precomputed(list) => list.first_start_bigger_eq(p),
        }
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = p;
        loop {
            let e = self.first_start_bigger_eq(cursor)?;
            if e.to >= p {
                return Some(e);
            }
            cursor = e.from + 1;
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        if let State::Precomputed(list) = &mut self.state {
            return list.last_start_smaller_eq(p);
        }
        let mut best = None;
        let mut cursor = Offset::MIN + 1;
        while let Some(e) = self.first_start_bigger_eq(cursor) {
            if e.from > p {
                break;
            }
            best = Some(e);
            cursor = e.from + 1;
        }
        best
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        if let State::Precomputed(list) = &mut self.state {
            return list.last_end_smaller_eq(p);
        }
        let mut best = None;
        let mut cursor = Offset::MIN + 1;
        while let Some(e) = self.first_start_bigger_eq(cursor) {
            if e.to > p {
                break;
            }
            best = Some(e);
            cursor = e.from + 1;
        }
        best
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

    fn optimize(&mut self) {
        let is_children = matches!(self.state, State::Children(_));
        if !is_children {
            return;
        }
        let any_empty = match &mut self.state {
            State::Children(children) => children.iter_mut().any(|c| c.length() == 0),
            State::Precomputed(_) => unreachable!(),
        };
        if any_empty {
            self.state = State::Precomputed(ArrayList::from_extents(&[]));
            return;
        }
        let total = self.length();
        if total <= PRECOMPUTE_THRESHOLD {
            let mut out = Vec::new();
            if let State::Children(children) = &mut self.state {
                Sequence::collect_all(children, &mut out);
            }
            self.state = State::Precomputed(ArrayList::from_extents(&out));
        }
    }
}

impl Sequence {
    fn collect_all(children: &mut [Box<dyn PostingList>], out: &mut Vec<Extent>) {
        let mut cursor = Offset::MIN + 1;
        while let Some(e) = Self::try_align(children, cursor) {
            out.push(e);
            cursor = e.from + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;
    use crate::postings::one_element::OneElementList;

    #[test]
    fn matches_adjacent_pairs() {
        // "new" at {7, 22, 55}, "york" at {8, 23, 40}
        let new = ArrayList::from_extents(&[Extent::new(7, 7), Extent::new(22, 22), Extent::new(55, 55)]);
        let york = ArrayList::from_extents(&[Extent::new(8, 8), Extent::new(23, 23), Extent::new(40, 40)]);
        let mut seq = Sequence::new(vec![Box::new(new), Box::new(york)]);
        let mut out = Vec::new();
        let n = seq.next_n(0, 100, 10, &mut out);
        assert_eq!(n, 2);
        assert_eq!(out, vec![Extent::new(7, 8), Extent::new(22, 23)]);
    }

    #[test]
    fn no_match_returns_empty() {
        let a = OneElementList::new(Extent::new(1, 1));
        let b = OneElementList::new(Extent::new(10, 10));
        let mut seq = Sequence::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(seq.length(), 0);
    }
}
