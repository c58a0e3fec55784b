use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};

/// One child of an `OrderedCombination`: `list` lives in its own local
/// offset space; `add_offset` is the additive shift that places it in
/// the combined global space, and `[lo, hi]` are the combined-space
/// bounds the caller computed when stitching the sub-indexes together
/// (spec §4.2: "concatenates N disjoint lists each with its own
/// additive offset").
pub struct Child {
    pub list: Box<dyn PostingList>,
    pub add_offset: Offset,
    pub lo: Offset,
    pub hi: Offset,
}

/// Concatenates disjoint sub-indexes into one global-offset posting
/// list. Children must be supplied in ascending order of their combined
/// range and must not overlap.
pub struct OrderedCombinationList {
    children: Vec<Child>,
    fwd_cursor: usize,
}

impl OrderedCombinationList {
    pub fn new(children: Vec<Child>) -> Self {
        debug_assert!(children.windows(2).all(|w| w[0].hi < w[1].lo));
        OrderedCombinationList { children, fwd_cursor: 0 }
    }

    fn child_index_for(&self, p: Offset, hint: usize) -> Option<usize> {
        if self.children.is_empty() {
            return None;
        }
        let mut i = hint.min(self.children.len() - 1);
        while i > 0 && self.children[i].lo > p {
            i -= 1;
        }
        while i + 1 < self.children.len() && self.children[i].hi < p {
            i += 1;
        }
        Some(i)
    }

    fn shift(e: Extent, add_offset: Offset) -> Extent {
        Extent::new(e.from + add_offset, e.to + add_offset)
    }
}

impl PostingList for OrderedCombinationList {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut i = self.child_index_for(p, self.fwd_cursor)?;
        loop {
            let child = &mut self.children[i];
            let local_p = (p - child.add_offset).max(child.lo - child.add_offset);
            if let Some(e) = child.list.first_start_bigger_eq(local_p) {
                self.fwd_cursor = i;
                return Some(Self::shift(e, child.add_offset));
            }
            i += 1;
            if i >= self.children.len() {
                return None;
            }
        }
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut i = self.child_index_for(p, self.fwd_cursor)?;
        loop {
            let child = &mut self.children[i];
            let local_p = (p - child.add_offset).max(child.lo - child.add_offset);
            if let Some(e) = child.list.first_end_bigger_eq(local_p) {
                self.fwd_cursor = i;
                return Some(Self::shift(e, child.add_offset));
            }
            i += 1;
            if i >= self.children.len() {
                return None;
            }
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut i = self.child_index_for(p, self.fwd_cursor)?;
        loop {
            let child = &mut self.children[i];
            let local_p = p - child.add_offset;
            if let Some(e) = child.list.last_start_smaller_eq(local_p) {
                return Some(Self::shift(e, child.add_offset));
            }
            if i == 0 {
                return None;
            }
            i -= 1;
        }
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut i = self.child_index_for(p, self.fwd_cursor)?;
        loop {
            let child = &mut self.children[i];
            let local_p = p - child.add_offset;
            if let Some(e) = child.list.last_end_smaller_eq(local_p) {
                return Some(Self::shift(e, child.add_offset));
            }
            if i == 0 {
                return None;
            }
            i -= 1;
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
        self.children.iter_mut().map(|c| c.list.length()).sum()
    }

    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        self.children
            .iter_mut()
            .filter(|c| c.lo <= to && c.hi >= from)
            .map(|c| {
                let local_from = (from - c.add_offset).max(c.lo - c.add_offset);
                let local_to = (to - c.add_offset).min(c.hi - c.add_offset);
                c.list.count(local_from, local_to)
            })
            .sum()
    }

    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        let mut remaining = i;
        for child in &mut self.children {
            let len = child.list.length();
            if remaining < len {
                return child.list.get_nth(remaining).map(|e| Self::shift(e, child.add_offset));
            }
            remaining -= len;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;

    #[test]
    fn concatenates_disjoint_subindexes() {
        let a = ArrayList::from_extents(&[Extent::new(0, 0), Extent::new(5, 5)]);
        let b = ArrayList::from_extents(&[Extent::new(0, 0), Extent::new(3, 3)]);
        let mut combo = OrderedCombinationList::new(vec![
            Child { list: Box::new(a), add_offset: 0, lo: 0, hi: 5 },
            Child { list: Box::new(b), add_offset: 100, lo: 100, hi: 103 },
        ]);
        assert_eq!(combo.first_start_bigger_eq(1), Some(Extent::new(5, 5)));
        assert_eq!(combo.first_start_bigger_eq(6), Some(Extent::new(100, 100)));
        assert_eq!(combo.length(), 4);
    }
}
