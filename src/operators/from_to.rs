//! FromTo operator (spec §4.3): pairs each opening marker from `from_list`
//! with the first closing marker after it from `to_list`, producing
//! well-nested container extents `(open.from, close.to)`.

use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};

pub struct FromTo {
    from_list: Box<dyn PostingList>,
    to_list: Box<dyn PostingList>,
}

impl FromTo {
    pub fn new(from_list: Box<dyn PostingList>, to_list: Box<dyn PostingList>) -> Self {
        FromTo { from_list, to_list }
    }

    fn pair_from(&mut self, pos: Offset) -> Option<Extent> {
        let open = self.from_list.first_start_bigger_eq(pos)?;
        let close = self.to_list.first_start_bigger_eq(open.to + 1)?;
        Some(Extent::new(open.from, close.to))
    }
}

impl PostingList for FromTo {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.pair_from(p)
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut cursor = Offset::MIN + 1;
        loop {
            let e = self.pair_from(cursor)?;
            if e.to >= p {
                return Some(e);
            }
            cursor = e.from + 1;
        }
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut best = None;
        let mut cursor = Offset::MIN + 1;
        while let Some(e) = self.pair_from(cursor) {
            if e.from > p {
                break;
            }
            best = Some(e);
            cursor = e.from + 1;
        }
        best
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let mut best = None;
        let mut cursor = Offset::MIN + 1;
        while let Some(e) = self.pair_from(cursor) {
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
            match self.pair_from(cursor) {
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
