use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};
use std::cell::RefCell;
use std::rc::Rc;

/// Delegates every call to a shared underlying list without taking
/// ownership (spec §4.2), so the same list can be driven from several
/// places in an operator tree without double-free or aliasing worries.
/// `PostingList` cursors are not thread-safe by contract (§5), so the
/// share is `Rc<RefCell<_>>` rather than `Arc<Mutex<_>>`: a `Copy` is
/// meant for sharing within one query's single-threaded operator tree,
/// not across threads.
pub struct CopyList {
    inner: Rc<RefCell<dyn PostingList>>,
}

impl CopyList {
    pub fn new(inner: Rc<RefCell<dyn PostingList>>) -> Self {
        CopyList { inner }
    }
}

impl PostingList for CopyList {
    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.inner.borrow_mut().first_start_bigger_eq(p)
    }
    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.inner.borrow_mut().first_end_bigger_eq(p)
    }
    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.inner.borrow_mut().last_start_smaller_eq(p)
    }
    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.inner.borrow_mut().last_end_smaller_eq(p)
    }
    fn next_n(&mut self, from: Offset, to: Offset, n: usize, out: &mut Vec<Extent>) -> usize {
        self.inner.borrow_mut().next_n(from, to, n, out)
    }
    fn length(&mut self) -> i64 {
        self.inner.borrow_mut().length()
    }
    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        self.inner.borrow_mut().count(from, to)
    }
    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        self.inner.borrow_mut().get_nth(i)
    }
    fn is_secure(&self) -> bool {
        self.inner.borrow().is_secure()
    }
    fn is_almost_secure(&self) -> bool {
        self.inner.borrow().is_almost_secure()
    }
    fn optimize(&mut self) {
        self.inner.borrow_mut().optimize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::one_element::OneElementList;

    #[test]
    fn two_copies_share_the_same_cursor_state() {
        let shared: Rc<RefCell<dyn PostingList>> =
            Rc::new(RefCell::new(OneElementList::new(Extent::new(5, 5))));
        let mut a = CopyList::new(shared.clone());
        let mut b = CopyList::new(shared);
        assert_eq!(a.first_start_bigger_eq(0), Some(Extent::new(5, 5)));
        assert_eq!(b.length(), 1);
    }
}
