//! Binary interpolative coding (Moffat & Stuiver). Unlike the other codecs
//! here, this one does not work on gaps: the whole block's absolute
//! offsets are encoded directly, first and last stored raw, then the
//! array is split recursively at its midpoint. Each midpoint is written
//! as a binary number relative to the range still implied by its
//! enclosing (lo, hi) bounds and the number of elements known to fall on
//! each side, which is why this codec does best on clustered lists: tight
//! bounds mean few bits per value even without a gap transform.

use crate::compression::bits::{BitReader, BitWriter};
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

fn bits_for_range(range: u64) -> u32 {
    if range == 0 {
        0
    } else {
        64 - range.leading_zeros()
    }
}

/// Writes `value - lo` using the minimal binary code for a range of size
/// `hi - lo + 1`, truncated-binary style so no bits are wasted when the
/// range isn't a power of two.
fn write_ranged(w: &mut BitWriter, value: u64, lo: u64, hi: u64) {
    let range = hi - lo + 1;
    if range <= 1 {
        return;
    }
    let k = bits_for_range(range - 1).max(1);
    let cutoff = (1u64 << k) - range;
    let v = value - lo;
    if v < cutoff {
        w.put_bits(v, k - 1);
    } else {
        w.put_bits(v + cutoff, k);
    }
}

fn read_ranged(r: &mut BitReader, lo: u64, hi: u64) -> EngineResult<u64> {
    let range = hi - lo + 1;
    if range <= 1 {
        return Ok(lo);
    }
    let k = bits_for_range(range - 1).max(1);
    let cutoff = (1u64 << k) - range;
    let prefix = r
        .get_bits(k - 1)
        .ok_or_else(|| EngineError::corrupted("truncated interpolative prefix"))?;
    let v = if prefix < cutoff {
        prefix
    } else {
        let extra = r.get_bit().ok_or_else(|| EngineError::corrupted("truncated interpolative extra bit"))?;
        ((prefix << 1) | extra as u64) - cutoff
    };
    Ok(lo + v)
}

fn encode_range(values: &[u64], lo: u64, hi: u64, w: &mut BitWriter) {
    if values.is_empty() {
        return;
    }
    let mid = values.len() / 2;
    let v = values[mid];
    // `mid` values must fit strictly below `v`, `values.len() - mid - 1`
    // strictly above, so the midpoint's own range shrinks as we descend.
    let lo_adj = lo + mid as u64;
    let hi_adj = hi - (values.len() - mid - 1) as u64;
    write_ranged(w, v, lo_adj, hi_adj);
    encode_range(&values[..mid], lo, v - 1, w);
    encode_range(&values[mid + 1..], v + 1, hi, w);
}

fn decode_range(out: &mut Vec<u64>, count: usize, lo: u64, hi: u64, r: &mut BitReader) -> EngineResult<()> {
    if count == 0 {
        return Ok(());
    }
    let mid = count / 2;
    let lo_adj = lo + mid as u64;
    let hi_adj = hi - (count - mid - 1) as u64;
    let v = read_ranged(r, lo_adj, hi_adj)?;

    decode_range_into(out, mid, lo, v - 1, r)?;
    out.push(v);
    decode_range_into(out, count - mid - 1, v + 1, hi, r)?;
    Ok(())
}

// Helper needed because recursion must write into the correct position;
// we build two temporary vectors and splice, keeping the logic simple
// over micro-optimising allocation.
fn decode_range_into(out: &mut Vec<u64>, count: usize, lo: u64, hi: u64, r: &mut BitReader) -> EngineResult<()> {
    let mut sub = Vec::with_capacity(count);
    decode_range(&mut sub, count, lo, hi, r)?;
    out.extend(sub);
    Ok(())
}

/// Interpolative coding works on absolute values, so this ignores the
/// gap-list convention used elsewhere in the module and takes/returns the
/// offsets directly.
pub fn encode_values(values: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if values.is_empty() {
        return out;
    }
    let vs: Vec<u64> = values.iter().map(|&v| v as u64).collect();
    let lo = vs[0];
    let hi = *vs.last().unwrap();
    out.extend_from_slice(&lo.to_le_bytes());
    out.extend_from_slice(&hi.to_le_bytes());
    if vs.len() > 2 {
        let mut w = BitWriter::new();
        encode_range(&vs[1..vs.len() - 1], lo, hi, &mut w);
        out.extend_from_slice(&w.finish());
    }
    out
}

pub fn decode_values(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    if buf.len() < 16 {
        return Err(EngineError::corrupted("truncated interpolative header"));
    }
    let lo = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let hi = u64::from_le_bytes(buf[8..16].try_into().unwrap());
    if n == 1 {
        return Ok(vec![lo as Offset]);
    }
    let mut middle = Vec::with_capacity(n - 2);
    if n > 2 {
        let mut r = BitReader::new(&buf[16..]);
        decode_range(&mut middle, n - 2, lo, hi, &mut r)?;
    }
    let mut result = Vec::with_capacity(n);
    result.push(lo as Offset);
    result.extend(middle.into_iter().map(|v| v as Offset));
    result.push(hi as Offset);
    Ok(result)
}

// Compatibility wrappers so interpolative can be dispatched the same way
// as the gap-based codecs: callers pass absolute offsets either way.
pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    encode_values(offsets)
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    decode_values(buf, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_clustered() {
        let xs: Vec<i64> = vec![10, 12, 13, 15, 20, 21, 22, 30];
        let buf = encode_values(&xs);
        assert_eq!(decode_values(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_single_and_pair() {
        assert_eq!(decode_values(&encode_values(&[7]), 1).unwrap(), vec![7]);
        assert_eq!(decode_values(&encode_values(&[7, 9]), 2).unwrap(), vec![7, 9]);
    }

    #[test]
    fn roundtrip_large_values() {
        let xs: Vec<i64> = (0..64).map(|i| i * (1i64 << 30) + i).collect();
        let buf = encode_values(&xs);
        assert_eq!(decode_values(&buf, xs.len()).unwrap(), xs);
    }
}
