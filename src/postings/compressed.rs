//! Compressed segmented list (spec §4.2): a sequence of compressed
//! blocks, each at most `MAX_SEGMENT_SIZE` postings, backed by a small
//! in-memory block index of `(first_posting, last_posting, count)`. A
//! block is decompressed on demand into a scratch buffer that the
//! cursor caches across calls, so a monotone scan through the list
//! decodes each block only once.
//!
//! Blocks here encode single-point occurrences (term position lists,
//! the dominant compressed-list shape); each decoded offset `p` is
//! exposed as the degenerate extent `(p, p)`.

use crate::compression::{self, DecodedBlock};
use crate::core::error::EngineResult;
use crate::core::offset::Offset;
use crate::postings::{Extent, PostingList};

struct BlockMeta {
    first: Offset,
    last: Offset,
    count: usize,
}

pub struct CompressedSegmentedList {
    frames: Vec<Vec<u8>>,
    meta: Vec<BlockMeta>,
    /// index of the block currently decoded into `scratch`, if any
    scratch_block: Option<usize>,
    scratch: Vec<Offset>,
    fwd_cursor_block: usize,
    fwd_cursor_in_block: usize,
    poisoned: bool,
}

impl CompressedSegmentedList {
    /// Builds a list from already-framed compressed blocks, each
    /// produced by `compression::compress_block`. Block metadata is
    /// derived by decoding each frame once up front (cheap relative to
    /// the I/O that produced the bytes); subsequent access reuses the
    /// scratch cache instead of redecoding.
    pub fn from_frames(frames: Vec<Vec<u8>>) -> EngineResult<Self> {
        let mut meta = Vec::with_capacity(frames.len());
        for frame in &frames {
            let DecodedBlock { offsets, .. } = compression::decompress_block(frame)?;
            let first = *offsets.first().unwrap_or(&0);
            let last = *offsets.last().unwrap_or(&0);
            meta.push(BlockMeta { first, last, count: offsets.len() });
        }
        Ok(CompressedSegmentedList {
            frames,
            meta,
            scratch_block: None,
            scratch: Vec::new(),
            fwd_cursor_block: 0,
            fwd_cursor_in_block: 0,
            poisoned: false,
        })
    }

    fn ensure_block_decoded(&mut self, block: usize) -> EngineResult<()> {
        if self.scratch_block == Some(block) {
            return Ok(());
        }
        let DecodedBlock { offsets, .. } = compression::decompress_block(&self.frames[block]).inspect_err(|_| {
            self.poisoned = true;
        })?;
        self.scratch = offsets;
        self.scratch_block = Some(block);
        Ok(())
    }

    /// Finds the block containing or following `p` by scanning block
    /// bounds from `hint` (blocks are few relative to postings, so a
    /// linear scan from the cursor is already amortised O(1) for
    /// monotone probes).
    fn locate_block_for(&self, p: Offset, hint: usize) -> usize {
        let mut b = hint.min(self.meta.len().saturating_sub(1));
        while b > 0 && self.meta[b].first > p {
            b -= 1;
        }
        while b + 1 < self.meta.len() && self.meta[b].last < p {
            b += 1;
        }
        b
    }

}

impl PostingList for CompressedSegmentedList {
    fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn first_start_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        if self.is_poisoned() || self.meta.is_empty() {
            return None;
        }
        let block = self.locate_block_for(p, self.fwd_cursor_block);
        if self.ensure_block_decoded(block).is_err() {
            return None;
        }
        let idx = self.scratch.partition_point(|&v| v < p);
        if idx < self.scratch.len() {
            self.fwd_cursor_block = block;
            self.fwd_cursor_in_block = idx;
            let v = self.scratch[idx];
            return Some(Extent::new(v, v));
        }
        // fell off the end of this block; try the next one
        if block + 1 < self.meta.len() {
            self.fwd_cursor_block = block + 1;
            self.fwd_cursor_in_block = 0;
            return self.first_start_bigger_eq(p);
        }
        None
    }

    fn first_end_bigger_eq(&mut self, p: Offset) -> Option<Extent> {
        self.first_start_bigger_eq(p)
    }

    fn last_start_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        if self.is_poisoned() || self.meta.is_empty() {
            return None;
        }
        let block = self.locate_block_for(p, self.fwd_cursor_block);
        if self.ensure_block_decoded(block).is_err() {
            return None;
        }
        let idx = self.scratch.partition_point(|&v| v <= p);
        if idx > 0 {
            return Some(Extent::new(self.scratch[idx - 1], self.scratch[idx - 1]));
        }
        if block > 0 {
            if self.ensure_block_decoded(block - 1).is_err() {
                return None;
            }
            return self.scratch.last().map(|&v| Extent::new(v, v));
        }
        None
    }

    fn last_end_smaller_eq(&mut self, p: Offset) -> Option<Extent> {
        self.last_start_smaller_eq(p)
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
        self.meta.iter().map(|m| m.count as i64).sum()
    }

    fn count(&mut self, from: Offset, to: Offset) -> i64 {
        let mut out = Vec::new();
        let mut total = 0i64;
        let mut cursor = from;
        loop {
            out.clear();
            let produced = self.next_n(cursor, to, 4096, &mut out);
            total += produced as i64;
            if produced < 4096 {
                break;
            }
            cursor = out.last().unwrap().from + 1;
        }
        total
    }

    fn get_nth(&mut self, i: i64) -> Option<Extent> {
        if i < 0 {
            return None;
        }
        let mut remaining = i;
        for b in 0..self.meta.len() {
            if (remaining as usize) < self.meta[b].count {
                if self.ensure_block_decoded(b).is_err() {
                    return None;
                }
                let v = self.scratch[remaining as usize];
                return Some(Extent::new(v, v));
            }
            remaining -= self.meta[b].count as i64;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CodecId;

    fn build_list() -> CompressedSegmentedList {
        let block1: Vec<Offset> = (0..10).map(|i| i * 3).collect();
        let block2: Vec<Offset> = (10..20).map(|i| i * 3).collect();
        let f1 = compression::compress_block(CodecId::Gamma, &block1, false);
        let f2 = compression::compress_block(CodecId::Simple9, &block2, false);
        CompressedSegmentedList::from_frames(vec![f1, f2]).unwrap()
    }

    #[test]
    fn first_start_bigger_eq_crosses_block_boundary() {
        let mut l = build_list();
        assert_eq!(l.first_start_bigger_eq(0), Some(Extent::new(0, 0)));
        assert_eq!(l.first_start_bigger_eq(28), Some(Extent::new(30, 30)));
        assert_eq!(l.first_start_bigger_eq(58), Some(Extent::new(58, 58)));
        assert_eq!(l.first_start_bigger_eq(59), None);
    }

    #[test]
    fn length_sums_across_blocks() {
        let mut l = build_list();
        assert_eq!(l.length(), 20);
    }

    #[test]
    fn get_nth_crosses_block_boundary() {
        let mut l = build_list();
        assert_eq!(l.get_nth(9), Some(Extent::new(27, 27)));
        assert_eq!(l.get_nth(10), Some(Extent::new(30, 30)));
        assert_eq!(l.get_nth(19), Some(Extent::new(57, 57)));
        assert_eq!(l.get_nth(20), None);
    }
}
