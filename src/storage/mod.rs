//! Minimal on-disk segment store (spec §2.4 of the expanded design): one
//! term's compressed postings live as a sequence of length-prefixed,
//! CRC32-checked frames appended to a single file under `base_dir`, with
//! a small in-memory `(first_posting, last_posting, byte_offset, count)`
//! block index kept alongside so a `CompressedSegmentedList` can be
//! rebuilt from disk without re-scanning the whole file. WAL, merge
//! policy, and MVCC are out of scope (spec.md's on-disk-build Non-goal);
//! this only persists the framed container the compression layer already
//! defines.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::compression::decompress_block;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

#[derive(Debug, Clone, Copy)]
pub struct BlockIndexEntry {
    pub first_posting: Offset,
    pub last_posting: Offset,
    pub byte_offset: u64,
    pub count: usize,
}

/// Term name -> append-ordered list of block index entries for that
/// term's file.
type Index = HashMap<String, Vec<BlockIndexEntry>>;

pub struct SegmentStore {
    base_dir: PathBuf,
    index: RwLock<Index>,
}

fn term_path(base_dir: &Path, term: &str) -> PathBuf {
    base_dir.join(format!("{term}.seg"))
}

impl SegmentStore {
    pub fn open(base_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(SegmentStore { base_dir, index: RwLock::new(HashMap::new()) })
    }

    /// Appends one already-encoded frame (as produced by
    /// `compression::compress_block`) to `term`'s file, recording its
    /// block index entry. The frame is re-decoded here only to learn its
    /// `(first, last, count)` bounds for the index, not to re-encode it.
    pub fn append_block(&self, term: &str, frame: &[u8]) -> EngineResult<()> {
        let decoded = decompress_block(frame)?;
        let (first, last) = match (decoded.offsets.first(), decoded.offsets.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return Err(EngineError::internal("cannot append an empty block")),
        };
        let count = decoded.offsets.len();

        let path = term_path(&self.base_dir, term);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let byte_offset = file.metadata()?.len();

        let checksum = crc32fast::hash(frame);
        file.write_all(&(frame.len() as u64).to_le_bytes())?;
        file.write_all(&checksum.to_le_bytes())?;
        file.write_all(frame)?;
        file.flush()?;

        let mut index = self.index.write();
        index.entry(term.to_string()).or_default().push(BlockIndexEntry {
            first_posting: first,
            last_posting: last,
            byte_offset,
            count,
        });
        Ok(())
    }

    /// Reads back every block for `term`, in append order, verifying each
    /// frame's checksum. Returns the raw compressed frames so the caller
    /// can feed them straight into `CompressedSegmentedList::from_frames`.
    pub fn read_frames(&self, term: &str) -> EngineResult<Vec<Vec<u8>>> {
        let entries = self.blocks_for(term);
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let path = term_path(&self.base_dir, term);
        let mut file = File::open(&path)?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in &entries {
            file.seek(SeekFrom::Start(entry.byte_offset))?;
            let mut len_buf = [0u8; 8];
            file.read_exact(&mut len_buf)?;
            let len = u64::from_le_bytes(len_buf) as usize;
            let mut checksum_buf = [0u8; 4];
            file.read_exact(&mut checksum_buf)?;
            let expected_checksum = u32::from_le_bytes(checksum_buf);
            let mut frame = vec![0u8; len];
            file.read_exact(&mut frame)?;
            if crc32fast::hash(&frame) != expected_checksum {
                return Err(EngineError::corrupted(format!("checksum mismatch for term {term} at offset {}", entry.byte_offset)));
            }
            out.push(frame);
        }
        Ok(out)
    }

    pub fn blocks_for(&self, term: &str) -> Vec<BlockIndexEntry> {
        self.index.read().get(term).cloned().unwrap_or_default()
    }

    /// Rebuilds the in-memory index from a file already on disk (e.g.
    /// after reopening the store), reading each frame once to learn its
    /// bounds.
    pub fn reload(&self, term: &str) -> EngineResult<()> {
        let path = term_path(&self.base_dir, term);
        if !path.exists() {
            return Ok(());
        }
        let mut file = File::open(&path)?;
        let mut entries = Vec::new();
        loop {
            let byte_offset = file.stream_position()?;
            let mut len_buf = [0u8; 8];
            match file.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u64::from_le_bytes(len_buf) as usize;
            let mut checksum_buf = [0u8; 4];
            file.read_exact(&mut checksum_buf)?;
            let expected_checksum = u32::from_le_bytes(checksum_buf);
            let mut frame = vec![0u8; len];
            file.read_exact(&mut frame)?;
            if crc32fast::hash(&frame) != expected_checksum {
                return Err(EngineError::corrupted(format!("checksum mismatch for term {term} at offset {byte_offset}")));
            }
            let decoded = decompress_block(&frame)?;
            let (first, last) = match (decoded.offsets.first(), decoded.offsets.last()) {
                (Some(&f), Some(&l)) => (f, l),
                _ => continue,
            };
            entries.push(BlockIndexEntry { first_posting: first, last_posting: last, byte_offset, count: decoded.offsets.len() });
        }
        self.index.write().insert(term.to_string(), entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{compress_block, CodecId};

    #[test]
    fn appends_and_reads_back_frames() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::open(dir.path()).unwrap();
        let frame_a = compress_block(CodecId::VByte, &[1, 5, 9], false);
        let frame_b = compress_block(CodecId::VByte, &[20, 25], false);
        store.append_block("alpha", &frame_a).unwrap();
        store.append_block("alpha", &frame_b).unwrap();

        let entries = store.blocks_for("alpha");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].first_posting, 1);
        assert_eq!(entries[0].last_posting, 9);
        assert_eq!(entries[1].first_posting, 20);

        let frames = store.read_frames("alpha").unwrap();
        assert_eq!(frames, vec![frame_a, frame_b]);
    }

    #[test]
    fn reload_rebuilds_index_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SegmentStore::open(dir.path()).unwrap();
            let frame = compress_block(CodecId::Gamma, &[2, 4, 8], false);
            store.append_block("beta", &frame).unwrap();
        }
        let store2 = SegmentStore::open(dir.path()).unwrap();
        assert!(store2.blocks_for("beta").is_empty());
        store2.reload("beta").unwrap();
        assert_eq!(store2.blocks_for("beta").len(), 1);
    }

    #[test]
    fn rejects_an_empty_block() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::open(dir.path()).unwrap();
        let frame = compress_block(CodecId::VByte, &[], false);
        assert!(store.append_block("gamma", &frame).is_err());
    }
}
