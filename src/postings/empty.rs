use crate::postings::{Extent, PostingList};
use crate::core::offset::Offset;

/// The posting list with no extents at all; a leaf used for terms that
/// never occur and as the identity-ish element for some operator
/// optimisations.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyList;

impl PostingList for EmptyList {
    fn first_start_bigger_eq(&mut self, _p: Offset) -> Option<Extent> {
        None
    }
    fn first_end_bigger_eq(&mut self, _p: Offset) -> Option<Extent> {
        None
    }
    fn last_start_smaller_eq(&mut self, _p: Offset) -> Option<Extent> {
        None
    }
    fn last_end_smaller_eq(&mut self, _p: Offset) -> Option<Extent> {
        None
    }
    fn next_n(&mut self, _from: Offset, _to: Offset, _n: usize, _out: &mut Vec<Extent>) -> usize {
        0
    }
    fn length(&mut self) -> i64 {
        0
    }
    fn count(&mut self, _from: Offset, _to: Offset) -> i64 {
        0
    }
    fn get_nth(&mut self, _i: i64) -> Option<Extent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answers_none_everywhere() {
        let mut e = EmptyList;
        assert_eq!(e.first_start_bigger_eq(0), None);
        assert_eq!(e.length(), 0);
        assert_eq!(e.count(0, 100), 0);
        assert_eq!(e.get_nth(0), None);
    }
}
