//! Simple-9: packs several small gaps into one 32-bit word — a 4-bit
//! selector picks one of nine `(items, bits)` layouts that fill the
//! remaining 28 data bits. A tenth selector (9) is an escape used when a
//! single gap does not fit even the 1-item/28-bit layout (offsets run up to
//! `2^47`, which plain Simple-9 was never designed for): the 32-bit word is
//! followed by one vByte-encoded 64-bit gap.

use crate::compression::vbyte;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

/// (items per word, bits per item) for selectors 0..=8.
const LAYOUTS: [(u32, u32); 9] = [
    (28, 1),
    (14, 2),
    (9, 3),
    (7, 4),
    (5, 5),
    (4, 7),
    (3, 9),
    (2, 14),
    (1, 28),
];

const ESCAPE_SELECTOR: u32 = 9;

fn fits(value: u64, bits: u32) -> bool {
    bits >= 64 || value < (1u64 << bits)
}

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();

    let mut i = 0usize;
    while i < gaps.len() {
        let remaining = &gaps[i..];
        // Greedily pick the layout that packs the most items from `remaining`.
        let mut best: Option<(usize, u32, u32)> = None; // (count, items, bits)
        for (idx, &(items, bits)) in LAYOUTS.iter().enumerate() {
            let take = (items as usize).min(remaining.len());
            if take == 0 {
                continue;
            }
            if remaining[..take].iter().all(|&v| fits(v, bits)) {
                let better = match best {
                    None => true,
                    Some((best_take, _, _)) => take > best_take,
                };
                if better {
                    best = Some((take, idx as u32, bits));
                }
            }
        }

        match best {
            Some((take, selector, bits)) => {
                let mut word: u32 = selector << 28;
                let mask: u32 = (1u32 << bits) - 1;
                for (slot, &v) in remaining[..take].iter().enumerate() {
                    word |= ((v as u32) & mask) << (slot as u32 * bits);
                }
                out.extend_from_slice(&word.to_le_bytes());
                i += take;
            }
            None => {
                // Escape: value too large even for 1x28.
                let word: u32 = ESCAPE_SELECTOR << 28;
                out.extend_from_slice(&word.to_le_bytes());
                vbyte::put_u64(&mut out, gaps[i]);
                i += 1;
            }
        }
    }
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated simple9 header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;
    let mut pos = 8usize;

    while result.len() < n {
        if pos + 4 > buf.len() {
            return Err(EngineError::corrupted("truncated simple9 word"));
        }
        let word = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let selector = word >> 28;
        if selector == ESCAPE_SELECTOR {
            let (gap, consumed) = vbyte::get_u64(&buf[pos..])?;
            pos += consumed;
            prev += gap as Offset;
            result.push(prev);
        } else {
            let (items, bits) = LAYOUTS[selector as usize];
            let mask: u32 = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
            for slot in 0..items {
                if result.len() >= n {
                    break;
                }
                let v = (word >> (slot * bits)) & mask;
                prev += v as Offset;
                result.push(prev);
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_small_gaps() {
        let xs: Vec<i64> = (0..50).map(|i| i * 2).collect();
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_with_large_gap_escape() {
        let xs: Vec<i64> = vec![0, 1, 2, 3, (1i64 << 40), (1i64 << 40) + 5];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }
}
