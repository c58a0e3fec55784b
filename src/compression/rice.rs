//! Rice codec: Golomb with `b` restricted to a power of two, chosen as the
//! nearest power-of-two approximation to the same `p = f/N` parameter (spec
//! §4.4). The remainder is then a fixed-width binary field, so no
//! truncated-binary bookkeeping is needed.

use crate::compression::bits::{BitReader, BitWriter};
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

fn choose_k(gaps: &[u64]) -> u32 {
    if gaps.is_empty() {
        return 0;
    }
    let n: u64 = gaps.iter().sum::<u64>().max(gaps.len() as u64) + 1;
    let f = gaps.len() as f64;
    let p = (f / n as f64).clamp(1e-9, 1.0 - 1e-9);
    let b = (-(2.0 - p).ln() / (1.0 - p).ln()).ceil().max(1.0);
    (b.log2().round() as i64).max(0) as u32
}

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut w = BitWriter::new();
    if offsets.is_empty() {
        return w.finish();
    }
    let gaps: Vec<u64> = offsets.windows(2).map(|win| (win[1] - win[0]) as u64).collect();
    let k = choose_k(&gaps);
    w.put_bits(offsets[0] as u64, 64);
    w.put_bits(k as u64, 8);
    for g in gaps {
        w.put_unary(g >> k);
        if k > 0 {
            w.put_bits(g & ((1u64 << k) - 1), k);
        }
    }
    w.finish()
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    let mut r = BitReader::new(buf);
    let first = r.get_bits(64).ok_or_else(|| EngineError::corrupted("truncated rice first"))? as Offset;
    let k = r.get_bits(8).ok_or_else(|| EngineError::corrupted("truncated rice param"))? as u32;
    result.push(first);
    let mut prev = first;
    for _ in 1..n {
        let q = r.get_unary().ok_or_else(|| EngineError::corrupted("truncated rice quotient"))?;
        let rem = if k > 0 {
            r.get_bits(k).ok_or_else(|| EngineError::corrupted("truncated rice remainder"))?
        } else {
            0
        };
        let gap = (q << k) | rem;
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
        let xs: Vec<i64> = vec![0, 4, 9, 15, 16, 100, 105, 4000];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }
}
