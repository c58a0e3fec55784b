use crate::postings::{Extent, PostingList};
use crate::core::offset::Offset;

/// A dense arithmetic sequence of single-point extents `(start + k*step,
/// start + k*step)` for `k in 0..count`. Used for synthetic/virtual
/// lists (e.g. "every token position") where materialising an array
/// would be wasteful; every query is closed-form arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct RangeList {
    start: Offset,
    step: Offset,
    count: i64,
}

impl RangeList {
    pub fn new(start: Offset, step: Offset, count: i64) -> Self {
        assert!(step > 0, "RangeList step must be positive");
        RangeList { start, step, count }
    }

    fn nth_value(&self, k: i64) -> Offset {
        self.start + (k as Offset) * self.step
    }

    /// Smallest `k` in `[0, count)` with `nth_value(k) >= p`, or `count`
    /// if none qualifies.
    fn ceil_index(&self, p: Offset) -> i64 {
        if p <= self.start {
            return 0;
        }
        let diff = p - self.start;
        let k = diff.div_ceil(self.step);
        k.min(self.count)
    }

    /// Largest `k` in `[0, count)` with `nth_value(k) <= p`, or `-1` if
    /// none qualifies.
    fn floor_index(&self, p: Offset) -> i64 {
        if p < self.start {
            return -1;
        }
        let diff = p - self.start;
        let k = diff / self.step;
        k.min(self.count - 1)
    }
}

impl PostingList for RangeList {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        let k = self.ceil_index(p);
        (k < self.count).then(|| Extent::new(self.nth_value(k), self.nth_value(k)))
    }
    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.first_start_bigger_eq(p)
    }
    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        let k = self.floor_index(p);
        (k >= 0).then(|| Extent::new(self.nth_value(k), self.nth_value(k)))
    }
    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.last_start_smaller_eq(p)
    }
    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        let mut k = self.ceil_index(from);
        let mut produced = 0;
        while produced < n && k < self.count {
            let v = self.nth_value(k);
            if v > to {
                break;
            }
            out.push(Extent::new(v, v));
            k += 1;
            produced += 1;
        }
        produced
    }
    fn length(&mut self) -> i64 {
        self.count
    }
    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        let lo = self.ceil_index(from);
        let hi = self.floor_index(to);
        (hi - lo + 1).max(0)
    }
    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        (i >= 0 && i < self.count).then(|| Extent::new(self.nth_value(i), self.nth_value(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_over_a_stride_two_range() {
        let mut r = RangeList::new(10, 2, 5); // 10,12,14,16,18
        assert_eq!(r.first_start_bigger_eq(11), Some(Extent::new(12, 12)));
        assert_eq!(r.last_end_smaller_eq(15), Some(Extent::new(14, 14)));
        assert_eq!(r.count(12, 16), 3);
        assert_eq!(r.get_nth(4), Some(Extent::new(18, 18)));
        assert_eq!(r.get_nth(5), None);
        assert_eq!(r.first_start_bigger_eq(19), None);
    }
}
