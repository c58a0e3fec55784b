//! Golomb codec. The parameter `b` is chosen per spec §4.4 from the gap
//! density `p = f/N` (f postings over a universe of size N, here taken as
//! the gap list's own span) as `b = ceil(-log(2-p) / log(1-p))`. Each gap
//! is split into quotient `q = gap / b` (unary) and remainder `gap % b`
//! (truncated binary, so values `< 2^k - b` take `k-1` bits and the rest
//! take `k` bits, with `k = ceil(log2(b))`).

use crate::compression::bits::{BitReader, BitWriter};
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

fn choose_b(gaps: &[u64]) -> u64 {
    if gaps.is_empty() {
        return 1;
    }
    let n: u64 = gaps.iter().sum::<u64>().max(gaps.len() as u64) + 1;
    let f = gaps.len() as f64;
    let p = (f / n as f64).clamp(1e-9, 1.0 - 1e-9);
    let b = (-(2.0 - p).ln() / (1.0 - p).ln()).ceil();
    (b as u64).max(1)
}

fn truncated_binary_k(b: u64) -> u32 {
    let mut k = 0u32;
    while (1u64 << k) < b {
        k += 1;
    }
    k
}

fn write_truncated(w: &mut BitWriter, r: u64, b: u64) {
    if b <= 1 {
        return;
    }
    let k = truncated_binary_k(b);
    let cutoff = (1u64 << k) - b;
    if r < cutoff {
        w.put_bits(r, k.saturating_sub(1).max(0));
    } else {
        w.put_bits(r + cutoff, k);
    }
}

fn read_truncated(r: &mut BitReader, b: u64) -> EngineResult<u64> {
    if b <= 1 {
        return Ok(0);
    }
    let k = truncated_binary_k(b);
    let kk = k.saturating_sub(1).max(0);
    let prefix = r.get_bits(kk).ok_or_else(|| EngineError::corrupted("truncated golomb remainder"))?;
    let cutoff = (1u64 << k) - b;
    if prefix < cutoff {
        Ok(prefix)
    } else {
        let extra = r.get_bit().ok_or_else(|| EngineError::corrupted("truncated golomb remainder bit"))?;
        Ok(((prefix << 1) | extra as u64) - cutoff)
    }
}

fn write_golomb(w: &mut BitWriter, value: u64, b: u64) {
    let q = value / b;
    let rem = value % b;
    w.put_unary(q);
    write_truncated(w, rem, b);
}

fn read_golomb(r: &mut BitReader, b: u64) -> EngineResult<u64> {
    let q = r.get_unary().ok_or_else(|| EngineError::corrupted("truncated golomb quotient"))?;
    let rem = read_truncated(r, b)?;
    Ok(q * b + rem)
}

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut w = BitWriter::new();
    if offsets.is_empty() {
        return w.finish();
    }
    let gaps: Vec<u64> = offsets.windows(2).map(|win| (win[1] - win[0]) as u64).collect();
    let b = choose_b(&gaps);
    w.put_bits(offsets[0] as u64, 64);
    w.put_bits(b, 32);
    for g in gaps {
        write_golomb(&mut w, g, b);
    }
    w.finish()
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    let mut r = BitReader::new(buf);
    let first = r.get_bits(64).ok_or_else(|| EngineError::corrupted("truncated golomb first"))? as Offset;
    let b = r.get_bits(32).ok_or_else(|| EngineError::corrupted("truncated golomb param"))?;
    result.push(first);
    let mut prev = first;
    for _ in 1..n {
        let gap = read_golomb(&mut r, b)?;
        prev += gap as Offset;
        result.push(prev);
    }
    Ok(result)
}
