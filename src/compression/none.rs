//! The identity codec: gaps stored as raw little-endian integers, no bit
//! packing at all. Exists so every block format in a segment can be
//! described by the same framed container (tag byte + count + payload)
//! even when compression isn't worth the CPU, and as the fallback
//! `mergeCompressed` decodes into before re-encoding.

use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::with_capacity(offsets.len() * 8);
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    for win in offsets.windows(2) {
        out.extend_from_slice(&((win[1] - win[0]) as u64).to_le_bytes());
    }
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < n * 8 {
        return Err(EngineError::corrupted("truncated none-codec block"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;
    for i in 1..n {
        let gap = u64::from_le_bytes(buf[i * 8..i * 8 + 8].try_into().unwrap());
        prev += gap as Offset;
        result.push(prev);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let xs: Vec<i64> = vec![0, 5, 5000000000, 5000000001];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn empty() {
        assert_eq!(decode_gaps(&[], 0).unwrap(), Vec::<i64>::new());
    }
}
