//! PForDelta: gaps are grouped into fixed-size blocks; within a block most
//! values are packed at a common bit-width `b` chosen to cover roughly 90%
//! of the block, and the few values that overflow `b` bits are pulled out
//! into an exception list of `(slot, value)` pairs appended after the
//! packed body (spec §4.4: "pick a bit-width covering ~90% of values;
//! patch the rest").

use crate::compression::vbyte;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

const BLOCK: usize = 128;

fn bits_needed(v: u64) -> u32 {
    if v == 0 {
        0
    } else {
        64 - v.leading_zeros()
    }
}

/// Smallest `b` such that at least 90% of `block` fits in `b` bits (min 1).
fn choose_b(block: &[u64]) -> u32 {
    let mut widths: Vec<u32> = block.iter().map(|&v| bits_needed(v)).collect();
    widths.sort_unstable();
    let idx = ((widths.len() as f64) * 0.9).ceil() as usize;
    let idx = idx.min(widths.len()).saturating_sub(1);
    widths[idx].max(1)
}

fn pack_block(block: &[u64], b: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&b.to_le_bytes());
    let mut exceptions: Vec<(u32, u64)> = Vec::new();
    let mask: u64 = if b >= 64 { u64::MAX } else { (1u64 << b) - 1 };

    let mut cur: u64 = 0;
    let mut filled = 0u32;
    let mut packed = Vec::new();
    for (slot, &v) in block.iter().enumerate() {
        let stored = if v > mask {
            exceptions.push((slot as u32, v));
            0
        } else {
            v
        };
        cur |= stored << filled;
        filled += b;
        while filled >= 8 {
            packed.push((cur & 0xFF) as u8);
            cur >>= 8;
            filled -= 8;
        }
    }
    if filled > 0 {
        packed.push((cur & 0xFF) as u8);
    }

    vbyte::put_u64(out, packed.len() as u64);
    out.extend_from_slice(&packed);
    vbyte::put_u64(out, exceptions.len() as u64);
    for (slot, value) in exceptions {
        vbyte::put_u64(out, slot as u64);
        vbyte::put_u64(out, value);
    }
}

fn unpack_block(buf: &[u8], count: usize) -> EngineResult<(Vec<u64>, usize)> {
    if buf.len() < 4 {
        return Err(EngineError::corrupted("truncated pfor block width"));
    }
    let b = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let mut pos = 4usize;

    let (packed_len, consumed) = vbyte::get_u64(&buf[pos..])?;
    pos += consumed;
    let packed_len = packed_len as usize;
    if pos + packed_len > buf.len() {
        return Err(EngineError::corrupted("truncated pfor packed body"));
    }
    let packed = &buf[pos..pos + packed_len];
    pos += packed_len;

    let mask: u64 = if b >= 64 { u64::MAX } else { (1u64 << b) - 1 };
    let mut values = Vec::with_capacity(count);
    let mut bitpos = 0usize;
    for _ in 0..count {
        let mut v: u64 = 0;
        for bit in 0..b as usize {
            let abs = bitpos + bit;
            let byte = abs / 8;
            let off = abs % 8;
            if byte >= packed.len() {
                return Err(EngineError::corrupted("pfor bit overrun"));
            }
            if (packed[byte] >> off) & 1 == 1 {
                v |= 1u64 << bit;
            }
        }
        values.push(v & mask);
        bitpos += b as usize;
    }

    let (num_exceptions, consumed) = vbyte::get_u64(&buf[pos..])?;
    pos += consumed;
    for _ in 0..num_exceptions {
        let (slot, c1) = vbyte::get_u64(&buf[pos..])?;
        pos += c1;
        let (value, c2) = vbyte::get_u64(&buf[pos..])?;
        pos += c2;
        if slot as usize >= values.len() {
            return Err(EngineError::corrupted("pfor exception slot out of range"));
        }
        values[slot as usize] = value;
    }

    Ok((values, pos))
}

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();
    for block in gaps.chunks(BLOCK) {
        let b = choose_b(block);
        pack_block(block, b, &mut out);
    }
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated pfor header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;
    let mut pos = 8usize;
    let total_gaps = n - 1;
    let mut produced = 0usize;

    while produced < total_gaps {
        let remaining = total_gaps - produced;
        let count = remaining.min(BLOCK);
        let (values, consumed) = unpack_block(&buf[pos..], count)?;
        pos += consumed;
        for v in values {
            prev += v as Offset;
            result.push(prev);
        }
        produced += count;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_uniform_block() {
        let xs: Vec<i64> = (0..300).map(|i| i * 3).collect();
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_with_outliers() {
        let mut xs: Vec<i64> = (0..200).map(|i| i * 2).collect();
        xs.push(xs.last().unwrap() + (1 << 30));
        xs.push(xs.last().unwrap() + 4);
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }
}
