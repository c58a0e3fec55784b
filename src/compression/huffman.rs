//! Huffman family. Both variants model a gap by its bit-length class and
//! Huffman-code that class (classes cluster heavily for real posting
//! lists, so a handful of canonical codes cover most gaps), storing the
//! residual low bits raw. `huffman_direct` is exactly that. `huffman2`
//! additionally folds one more bit of magnitude (the bit just below the
//! implicit leading one) into the Huffman symbol, doubling the alphabet
//! but sharpening the fit for skewed distributions, at the cost of a
//! larger canonical-code table (spec §4.4 names both as one family).
//!
//! Canonical codes are rebuilt per list from an embedded `(symbol, code
//! length)` table rather than a fixed external dictionary, so every
//! frame is self-describing.

use crate::compression::bits::{BitReader, BitWriter};
use crate::compression::vbyte;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

fn bit_class(v: u64) -> u32 {
    if v == 0 {
        0
    } else {
        64 - v.leading_zeros()
    }
}

/// Builds code lengths via a standard Huffman merge, then assigns
/// canonical codes in `(length, symbol)` order.
pub(crate) fn build_canonical(freqs: &HashMap<u32, u64>) -> Vec<(u32, u8)> {
    if freqs.len() == 1 {
        let sym = *freqs.keys().next().unwrap();
        return vec![(sym, 1)];
    }

    #[derive(Eq, PartialEq)]
    struct Node {
        freq: u64,
        syms: Vec<u32>,
    }
    impl Ord for Node {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            other.freq.cmp(&self.freq)
        }
    }
    impl PartialOrd for Node {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    let mut lengths: HashMap<u32, u8> = freqs.keys().map(|&s| (s, 0)).collect();
    let mut heap: BinaryHeap<Reverse<(u64, usize, Vec<u32>)>> = BinaryHeap::new();
    for (i, (&sym, &freq)) in freqs.iter().enumerate() {
        heap.push(Reverse((freq, i, vec![sym])));
    }
    let mut next_id = freqs.len();
    while heap.len() > 1 {
        let Reverse((f1, _, s1)) = heap.pop().unwrap();
        let Reverse((f2, _, s2)) = heap.pop().unwrap();
        for &s in s1.iter().chain(s2.iter()) {
            *lengths.get_mut(&s).unwrap() += 1;
        }
        let mut merged = s1;
        merged.extend(s2);
        heap.push(Reverse((f1 + f2, next_id, merged)));
        next_id += 1;
    }

    let mut out: Vec<(u32, u8)> = lengths.into_iter().map(|(s, l)| (s, l.max(1))).collect();
    out.sort_by_key(|&(s, l)| (l, s));
    out
}

/// Package-merge (coin-collector's) construction of a canonical code whose
/// longest codeword is at most `max_len` bits, for alphabets small enough
/// that an unrestricted Huffman tree could in principle exceed it (LLRUN's
/// bit-length-class alphabet tops out at 32 symbols but can still be
/// skewed enough to need this). Builds `max_len` successive "coin lists":
/// each list packages the previous one's entries pairwise and remerges
/// with the base symbol weights; a symbol's final code length is how many
/// times it survives into the first `2*(n-1)` entries of the last list.
pub(crate) fn build_canonical_limited(freqs: &HashMap<u32, u64>, max_len: u8) -> Vec<(u32, u8)> {
    if freqs.len() == 1 {
        let sym = *freqs.keys().next().unwrap();
        return vec![(sym, 1)];
    }

    let mut items: Vec<(u64, u32)> = freqs.iter().map(|(&sym, &freq)| (freq, sym)).collect();
    items.sort();
    let n = items.len();
    let base: Vec<(u64, Vec<usize>)> = items.iter().enumerate().map(|(i, &(f, _))| (f, vec![i])).collect();

    let mut current = base.clone();
    for _ in 0..max_len.saturating_sub(1) {
        let mut packaged: Vec<(u64, Vec<usize>)> = base.clone();
        let mut i = 0;
        while i + 1 < current.len() {
            let mut syms = current[i].1.clone();
            syms.extend(current[i + 1].1.clone());
            packaged.push((current[i].0 + current[i + 1].0, syms));
            i += 2;
        }
        packaged.sort_by_key(|(f, _)| *f);
        current = packaged;
    }

    let mut counts = vec![0u32; n];
    let take = (2 * (n - 1)).min(current.len());
    for (_, syms) in &current[..take] {
        for &idx in syms {
            counts[idx] += 1;
        }
    }

    let mut out: Vec<(u32, u8)> =
        items.iter().enumerate().map(|(i, &(_, sym))| (sym, counts[i].max(1) as u8)).collect();
    out.sort_by_key(|&(sym, len)| (len, sym));
    out
}

pub(crate) fn assign_codes(canonical: &[(u32, u8)]) -> HashMap<u32, (u32, u8)> {
    let mut map = HashMap::new();
    let mut code: u32 = 0;
    let mut prev_len = canonical[0].1;
    for &(sym, len) in canonical {
        code <<= len - prev_len;
        map.insert(sym, (code, len));
        code += 1;
        prev_len = len;
    }
    map
}

pub(crate) fn write_table(canonical: &[(u32, u8)], out: &mut Vec<u8>) {
    vbyte::put_u64(out, canonical.len() as u64);
    for &(sym, len) in canonical {
        vbyte::put_u64(out, sym as u64);
        out.push(len);
    }
}

pub(crate) fn read_table(buf: &[u8]) -> EngineResult<(Vec<(u32, u8)>, usize)> {
    let mut pos = 0usize;
    let (count, c) = vbyte::get_u64(buf)?;
    pos += c;
    let mut canonical = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (sym, c1) = vbyte::get_u64(&buf[pos..])?;
        pos += c1;
        if pos >= buf.len() {
            return Err(EngineError::corrupted("truncated huffman table"));
        }
        let len = buf[pos];
        pos += 1;
        canonical.push((sym as u32, len));
    }
    Ok((canonical, pos))
}

pub(crate) fn decode_map(canonical: &[(u32, u8)]) -> HashMap<(u8, u32), u32> {
    if canonical.is_empty() {
        return HashMap::new();
    }
    let codes = assign_codes(canonical);
    codes.into_iter().map(|(sym, (code, len))| ((len, code), sym)).collect()
}

pub(crate) fn read_symbol(r: &mut BitReader, table: &HashMap<(u8, u32), u32>) -> EngineResult<u32> {
    let mut code: u32 = 0;
    for len in 1..=32u8 {
        let bit = r.get_bit().ok_or_else(|| EngineError::corrupted("truncated huffman code"))?;
        code = (code << 1) | bit as u32;
        if let Some(&sym) = table.get(&(len, code)) {
            return Ok(sym);
        }
    }
    Err(EngineError::corrupted("huffman code did not resolve to a symbol"))
}

// ---- huffman-direct: symbol == bit-length class --------------------------

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();
    let classes: Vec<u32> = gaps.iter().map(|&v| bit_class(v)).collect();

    let mut freqs: HashMap<u32, u64> = HashMap::new();
    for &c in &classes {
        *freqs.entry(c).or_insert(0) += 1;
    }
    let canonical = build_canonical(&freqs);
    let codes = assign_codes(&canonical);
    write_table(&canonical, &mut out);

    let mut w = BitWriter::new();
    for (&g, &c) in gaps.iter().zip(classes.iter()) {
        let (code, len) = codes[&c];
        w.put_bits(code as u64, len as u32);
        if c > 0 {
            w.put_bits(g, c - 1);
        }
    }
    out.extend_from_slice(&w.finish());
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated huffman header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;

    let (canonical, consumed) = read_table(&buf[8..])?;
    let table = decode_map(&canonical);
    let mut r = BitReader::new(&buf[8 + consumed..]);

    for _ in 1..n {
        let class = read_symbol(&mut r, &table)?;
        let low = if class > 0 {
            r.get_bits(class - 1).ok_or_else(|| EngineError::corrupted("truncated huffman residual"))?
        } else {
            0
        };
        prev += low as Offset;
        result.push(prev);
    }
    Ok(result)
}

// ---- huffman2: symbol folds one extra magnitude bit ----------------------

fn huffman2_symbol(v: u64, class: u32) -> (u32, u32, u32) {
    // returns (symbol, raw_bits_count, raw_value)
    if class < 2 {
        (class, 0, 0)
    } else {
        let low_bits = class - 1;
        let top = ((v >> (low_bits - 1)) & 1) as u32;
        let raw_bits = low_bits - 1;
        let raw = (v & ((1u64 << raw_bits) - 1)) as u32;
        (class * 2 + top, raw_bits, raw)
    }
}

fn huffman2_value(symbol: u32, raw: u64) -> (u64, u32) {
    if symbol < 4 {
        // class 0 or 1, encoded as symbol == class (no top-bit split applied)
        let _ = raw;
        return (symbol as u64, 0);
    }
    let class = symbol / 2;
    let top = symbol % 2;
    let low_bits = class - 1;
    let raw_bits = low_bits - 1;
    let v = (1u64 << low_bits) | ((top as u64) << raw_bits) | raw;
    (v, raw_bits)
}

pub fn encode_gaps_v2(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();
    let classes: Vec<u32> = gaps.iter().map(|&v| bit_class(v)).collect();
    let symbols: Vec<(u32, u32, u32)> = gaps
        .iter()
        .zip(classes.iter())
        .map(|(&v, &c)| huffman2_symbol(v, c))
        .collect();

    let mut freqs: HashMap<u32, u64> = HashMap::new();
    for &(sym, _, _) in &symbols {
        *freqs.entry(sym).or_insert(0) += 1;
    }
    let canonical = build_canonical(&freqs);
    let codes = assign_codes(&canonical);
    write_table(&canonical, &mut out);

    let mut w = BitWriter::new();
    for &(sym, raw_bits, raw) in &symbols {
        let (code, len) = codes[&sym];
        w.put_bits(code as u64, len as u32);
        if raw_bits > 0 {
            w.put_bits(raw as u64, raw_bits);
        }
    }
    out.extend_from_slice(&w.finish());
    out
}

pub fn decode_gaps_v2(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated huffman2 header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;

    let (canonical, consumed) = read_table(&buf[8..])?;
    let table = decode_map(&canonical);
    let mut r = BitReader::new(&buf[8 + consumed..]);

    for _ in 1..n {
        let symbol = read_symbol(&mut r, &table)?;
        let (_, raw_bits) = huffman2_value(symbol, 0);
        let raw = if raw_bits > 0 {
            r.get_bits(raw_bits).ok_or_else(|| EngineError::corrupted("truncated huffman2 residual"))?
        } else {
            0
        };
        let (v, _) = huffman2_value(symbol, raw);
        prev += v as Offset;
        result.push(prev);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_direct() {
        let xs: Vec<i64> = vec![0, 1, 2, 4, 8, 9, 10, 1000, 1001, 1002, 1 << 30, (1 << 30) + 1];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_v2() {
        let xs: Vec<i64> = vec![0, 1, 2, 4, 8, 9, 10, 1000, 1001, 1002, 1 << 30, (1 << 30) + 1];
        let buf = encode_gaps_v2(&xs);
        assert_eq!(decode_gaps_v2(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_single_symbol() {
        let xs: Vec<i64> = vec![0, 1, 2, 3, 4, 5];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }
}
