//! LLRUN: gaps are reduced to their bit-length class (`0` for a zero gap,
//! otherwise `bits_needed(gap)`), and the class sequence is coded with a
//! length-limited (at most 10 bits) canonical Huffman code over the
//! `0..32` class alphabet, built on the same machinery
//! (`huffman::build_canonical_limited`/`assign_codes`/`write_table`/
//! `read_table`) the `huffman_direct`/`huffman2` codecs use. A list with
//! only one distinct class skips the table entirely and writes a single
//! marker class byte instead. Each gap's residual low bits (its value
//! minus the class's implicit leading one) follow the class code, same
//! trick as gamma.
//!
//! `LLRUN-Multi` partitions the class alphabet into up to 4 sub-alphabets
//! by a KL-divergence split over class bigram co-occurrence (which class
//! immediately preceded which), then Huffman-codes each sub-alphabet
//! separately: the partition a gap's class is coded under is whichever
//! sub-alphabet the *previous* gap's class was assigned to, so a region of
//! the list with one magnitude profile doesn't force a class switch in
//! another region's table.

use crate::compression::bits::{BitReader, BitWriter};
use crate::compression::huffman::{assign_codes, build_canonical_limited, decode_map, read_symbol, read_table, write_table};
use crate::compression::vbyte;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;
use std::collections::HashMap;

const MAX_CODE_LEN: u8 = 10;
/// `bit_class` ranges over `0..=64` for a `u64` gap, so the alphabet needs
/// one slot per possible class, not just the 32 small-gap buckets the
/// common case sees.
const NUM_CLASSES: usize = 65;
const NUM_PARTITIONS: usize = 4;
const MULTI_MIN_GAPS: usize = 128 * (NUM_PARTITIONS - 1);

fn bit_class(v: u64) -> u32 {
    if v == 0 {
        0
    } else {
        64 - v.leading_zeros()
    }
}

fn write_low_bits(w: &mut BitWriter, v: u64, class: u32) {
    if class > 0 {
        w.put_bits(v, class - 1);
    }
}

fn read_low_bits(r: &mut BitReader, class: u32) -> EngineResult<u64> {
    if class == 0 {
        return Ok(0);
    }
    let low = r.get_bits(class - 1).ok_or_else(|| EngineError::corrupted("truncated llrun value bits"))?;
    Ok((1u64 << (class - 1)) | low)
}

// ---- single-model LLRUN --------------------------------------------------

fn encode_segment(gaps: &[u64], out: &mut Vec<u8>) {
    let classes: Vec<u32> = gaps.iter().map(|&v| bit_class(v)).collect();
    let mut freqs: HashMap<u32, u64> = HashMap::new();
    for &c in &classes {
        *freqs.entry(c).or_insert(0) += 1;
    }

    let mut w = BitWriter::new();
    if freqs.len() <= 1 {
        out.push(0);
        out.push(classes.first().copied().unwrap_or(0) as u8);
        for (&v, &c) in gaps.iter().zip(classes.iter()) {
            write_low_bits(&mut w, v, c);
        }
    } else {
        out.push(1);
        let canonical = build_canonical_limited(&freqs, MAX_CODE_LEN);
        let codes = assign_codes(&canonical);
        write_table(&canonical, out);
        for (&v, &c) in gaps.iter().zip(classes.iter()) {
            let (code, len) = codes[&c];
            w.put_bits(code as u64, len as u32);
            write_low_bits(&mut w, v, c);
        }
    }
    let body = w.finish();
    vbyte::put_u64(out, body.len() as u64);
    out.extend_from_slice(&body);
}

fn decode_segment(buf: &[u8], count: usize) -> EngineResult<(Vec<u64>, usize)> {
    if buf.is_empty() {
        return Err(EngineError::corrupted("truncated llrun segment"));
    }
    let mut pos = 0usize;
    let flag = buf[pos];
    pos += 1;

    if flag == 0 {
        if pos >= buf.len() {
            return Err(EngineError::corrupted("truncated llrun single-class marker"));
        }
        let class = buf[pos] as u32;
        pos += 1;
        let (body_len, c) = vbyte::get_u64(&buf[pos..])?;
        pos += c;
        let body_len = body_len as usize;
        if pos + body_len > buf.len() {
            return Err(EngineError::corrupted("truncated llrun body"));
        }
        let mut r = BitReader::new(&buf[pos..pos + body_len]);
        pos += body_len;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(read_low_bits(&mut r, class)?);
        }
        return Ok((values, pos));
    }

    let (canonical, consumed) = read_table(&buf[pos..])?;
    pos += consumed;
    let table = decode_map(&canonical);
    let (body_len, c) = vbyte::get_u64(&buf[pos..])?;
    pos += c;
    let body_len = body_len as usize;
    if pos + body_len > buf.len() {
        return Err(EngineError::corrupted("truncated llrun body"));
    }
    let mut r = BitReader::new(&buf[pos..pos + body_len]);
    pos += body_len;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let class = read_symbol(&mut r, &table)?;
        values.push(read_low_bits(&mut r, class)?);
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
    encode_segment(&gaps, &mut out);
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated llrun header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let (values, _) = decode_segment(&buf[8..], n - 1)?;
    let mut prev = first;
    for v in values {
        prev += v as Offset;
        result.push(prev);
    }
    Ok(result)
}

// ---- LLRUN-Multi: alphabet partitioning by KL divergence -----------------

/// Finds the class boundary in `0..NUM_CLASSES-1` whose two sides have the
/// most divergent next-class distributions, mirroring the original
/// engine's per-element bit-count accounting (`pair_freqs[prev][cur]`).
/// Returns `None` when there isn't enough data for a meaningful split.
fn best_kl_split(freqs: &[u64; NUM_CLASSES], pair_freqs: &[[u64; NUM_CLASSES]; NUM_CLASSES], total: u64) -> Option<usize> {
    if total < 2 {
        return None;
    }
    let n = total as f64;
    let mut cum = [0u64; NUM_CLASSES];
    let mut best_split = None;
    let mut best_kld = 0f64;
    for i in 0..NUM_CLASSES - 1 {
        for k in 0..NUM_CLASSES {
            cum[k] += pair_freqs[i][k];
        }
        let count: u64 = cum.iter().sum();
        if count < 1 {
            continue;
        }
        if count as i64 > total as i64 - 2 {
            break;
        }
        let count_f = count as f64;
        let rest_f = n - count_f;
        let mut kld1 = 0f64;
        let mut kld2 = 0f64;
        for k in 0..NUM_CLASSES {
            let q = (freqs[k] as f64 + 1.0) / n;
            let p = (cum[k] as f64 + 1.0) / count_f;
            let r = (freqs[k] as f64 - cum[k] as f64 + 1.0) / rest_f;
            kld1 += p * (p / q).ln();
            kld2 += r * (r / q).ln();
        }
        let kld = kld1 * count_f + kld2 * rest_f;
        if kld > best_kld {
            best_kld = kld;
            best_split = Some(i);
        }
    }
    best_split
}

/// Maps each bit-length class to the partition (`0..NUM_PARTITIONS`) that
/// should be used for the gap immediately *after* one of that class:
/// splits the whole alphabet in two by the best KL boundary, then splits
/// each half again the same way to reach up to 4 partitions.
fn partition_classes(classes: &[u32]) -> [usize; NUM_CLASSES] {
    let mut freqs = [0u64; NUM_CLASSES];
    let mut pair_freqs = [[0u64; NUM_CLASSES]; NUM_CLASSES];
    let mut prev: Option<u32> = None;
    for &c in classes {
        freqs[c as usize] += 1;
        if let Some(p) = prev {
            pair_freqs[p as usize][c as usize] += 1;
        }
        prev = Some(c);
    }
    let total = classes.len() as u64;

    let mut partition = [0usize; NUM_CLASSES];
    let Some(top_split) = best_kl_split(&freqs, &pair_freqs, total) else {
        return partition;
    };
    for (c, slot) in partition.iter_mut().enumerate() {
        *slot = if c <= top_split { 0 } else { 1 };
    }

    for (half, promote_to) in [(0usize, 2usize), (1usize, 3usize)] {
        let half_total: u64 = (0..NUM_CLASSES).filter(|&c| partition[c] == half).map(|c| freqs[c]).sum();
        if half_total < 2 {
            continue;
        }
        let mut sub_freqs = [0u64; NUM_CLASSES];
        let mut sub_pair = [[0u64; NUM_CLASSES]; NUM_CLASSES];
        for c in 0..NUM_CLASSES {
            if partition[c] == half {
                sub_freqs[c] = freqs[c];
            }
        }
        for i in 0..NUM_CLASSES {
            if partition[i] != half {
                continue;
            }
            for k in 0..NUM_CLASSES {
                if partition[k] == half {
                    sub_pair[i][k] = pair_freqs[i][k];
                }
            }
        }
        if let Some(split) = best_kl_split(&sub_freqs, &sub_pair, half_total) {
            for c in (split + 1)..NUM_CLASSES {
                if partition[c] == half {
                    partition[c] = promote_to;
                }
            }
        }
    }
    partition
}

fn encode_multi_segment(gaps: &[u64], out: &mut Vec<u8>) {
    let classes: Vec<u32> = gaps.iter().map(|&v| bit_class(v)).collect();
    let partition = partition_classes(&classes);

    let mut freqs: [HashMap<u32, u64>; NUM_PARTITIONS] = [HashMap::new(), HashMap::new(), HashMap::new(), HashMap::new()];
    let mut current = 0usize;
    for &c in &classes {
        *freqs[current].entry(c).or_insert(0) += 1;
        current = partition[c as usize];
    }

    for c in 0..NUM_CLASSES {
        out.push(partition[c] as u8);
    }

    let mut codes: Vec<HashMap<u32, (u32, u8)>> = Vec::with_capacity(NUM_PARTITIONS);
    for freq in &freqs {
        if freq.is_empty() {
            write_table(&[], out);
            codes.push(HashMap::new());
            continue;
        }
        let canonical = build_canonical_limited(freq, MAX_CODE_LEN);
        write_table(&canonical, out);
        codes.push(assign_codes(&canonical));
    }

    let mut w = BitWriter::new();
    current = 0;
    for (&v, &c) in gaps.iter().zip(classes.iter()) {
        let (code, len) = codes[current][&c];
        w.put_bits(code as u64, len as u32);
        write_low_bits(&mut w, v, c);
        current = partition[c as usize];
    }
    let body = w.finish();
    vbyte::put_u64(out, body.len() as u64);
    out.extend_from_slice(&body);
}

fn decode_multi_segment(buf: &[u8], count: usize) -> EngineResult<(Vec<u64>, usize)> {
    let mut pos = 0usize;
    if pos + NUM_CLASSES > buf.len() {
        return Err(EngineError::corrupted("truncated llrun-multi partition map"));
    }
    let mut partition = [0usize; NUM_CLASSES];
    for (c, slot) in partition.iter_mut().enumerate() {
        *slot = buf[pos + c] as usize;
    }
    pos += NUM_CLASSES;

    let mut decode_tables = Vec::with_capacity(NUM_PARTITIONS);
    for _ in 0..NUM_PARTITIONS {
        let (canonical, consumed) = read_table(&buf[pos..])?;
        pos += consumed;
        decode_tables.push(decode_map(&canonical));
    }

    let (body_len, c) = vbyte::get_u64(&buf[pos..])?;
    pos += c;
    let body_len = body_len as usize;
    if pos + body_len > buf.len() {
        return Err(EngineError::corrupted("truncated llrun-multi body"));
    }
    let mut r = BitReader::new(&buf[pos..pos + body_len]);
    pos += body_len;

    let mut values = Vec::with_capacity(count);
    let mut current = 0usize;
    for _ in 0..count {
        let class = read_symbol(&mut r, &decode_tables[current])?;
        values.push(read_low_bits(&mut r, class)?);
        current = partition[class as usize];
    }
    Ok((values, pos))
}

pub fn encode_gaps_multi(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();
    if gaps.len() < MULTI_MIN_GAPS {
        out.push(0);
        encode_segment(&gaps, &mut out);
    } else {
        out.push(1);
        encode_multi_segment(&gaps, &mut out);
    }
    out
}

pub fn decode_gaps_multi(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 9 {
        return Err(EngineError::corrupted("truncated llrun-multi header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mode = buf[8];
    let rest = &buf[9..];
    let (values, _) = match mode {
        0 => decode_segment(rest, n - 1)?,
        1 => decode_multi_segment(rest, n - 1)?,
        _ => return Err(EngineError::corrupted("unknown llrun-multi mode")),
    };
    let mut prev = first;
    for v in values {
        prev += v as Offset;
        result.push(prev);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_single_model() {
        let xs: Vec<i64> = vec![0, 1, 2, 4, 8, 9, 10, 1000, 1001, 1002, 1 << 30];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_single_class() {
        let xs: Vec<i64> = vec![0, 1, 2, 3, 4, 5, 6];
        let buf = encode_gaps(&xs);
        assert_eq!(decode_gaps(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_multi_falls_back_below_threshold() {
        let xs: Vec<i64> = (0..50).map(|i| i * i % 900).scan(0i64, |acc, d| {
            *acc += d.max(1);
            Some(*acc)
        }).collect();
        let buf = encode_gaps_multi(&xs);
        assert_eq!(decode_gaps_multi(&buf, xs.len()).unwrap(), xs);
    }

    #[test]
    fn roundtrip_multi_above_threshold() {
        let xs: Vec<i64> = (0..2000)
            .map(|i: i64| if i % 17 == 0 { 1 << 20 } else { 1 + (i % 5) })
            .scan(0i64, |acc, d| {
                *acc += d;
                Some(*acc)
            })
            .collect();
        let buf = encode_gaps_multi(&xs);
        assert_eq!(decode_gaps_multi(&buf, xs.len()).unwrap(), xs);
    }
}
