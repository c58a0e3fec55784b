//! GUBC ("generalized unary/binary coding") and its interpolative variant
//! GUBC-IP. Gaps are split into fixed-size chunks (`RHO` gaps per chunk);
//! each chunk is prefixed with its own encoded byte length so a reader can
//! skip whole chunks without decoding them (the role `optSigma` sync
//! points play in the original scheme). Within a chunk, `optTau` picks a
//! Rice parameter from the chunk's own gap distribution rather than a
//! single list-wide one, trading a few header bytes per chunk for a
//! tighter fit to local bursts. GUBC-IP replaces the per-chunk Rice body
//! with straight binary packing against the chunk's own `[min, max]`
//! range, which is the chunk-local flavour of interpolative coding: no
//! assumption about the global list shape, just "how many bits to tell
//! these 32 values apart".

use crate::compression::bits::{BitReader, BitWriter};
use crate::compression::vbyte;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

const RHO: usize = 32;

fn choose_tau(chunk: &[u64]) -> u32 {
    if chunk.is_empty() {
        return 0;
    }
    let mean = (chunk.iter().sum::<u64>() as f64 / chunk.len() as f64).max(1.0);
    mean.log2().round().max(0.0) as u32
}

fn encode_rice_chunk(chunk: &[u64], tau: u32, w: &mut BitWriter) {
    for &g in chunk {
        w.put_unary(g >> tau);
        if tau > 0 {
            w.put_bits(g & ((1u64 << tau) - 1), tau);
        }
    }
}

fn decode_rice_chunk(r: &mut BitReader, count: usize, tau: u32) -> EngineResult<Vec<u64>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let q = r.get_unary().ok_or_else(|| EngineError::corrupted("truncated gubc quotient"))?;
        let rem = if tau > 0 {
            r.get_bits(tau).ok_or_else(|| EngineError::corrupted("truncated gubc remainder"))?
        } else {
            0
        };
        out.push((q << tau) | rem);
    }
    Ok(out)
}

pub fn encode_gaps(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();

    for chunk in gaps.chunks(RHO) {
        let tau = choose_tau(chunk);
        let mut w = BitWriter::new();
        encode_rice_chunk(chunk, tau, &mut w);
        let body = w.finish();
        out.extend_from_slice(&tau.to_le_bytes());
        vbyte::put_u64(&mut out, body.len() as u64);
        out.extend_from_slice(&body);
    }
    out
}

pub fn decode_gaps(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated gubc header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;
    let mut pos = 8usize;
    let total_gaps = n - 1;
    let mut produced = 0usize;

    while produced < total_gaps {
        let count = (total_gaps - produced).min(RHO);
        if pos + 4 > buf.len() {
            return Err(EngineError::corrupted("truncated gubc chunk tau"));
        }
        let tau = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let (body_len, consumed) = vbyte::get_u64(&buf[pos..])?;
        pos += consumed;
        let body_len = body_len as usize;
        if pos + body_len > buf.len() {
            return Err(EngineError::corrupted("truncated gubc chunk body"));
        }
        let mut r = BitReader::new(&buf[pos..pos + body_len]);
        pos += body_len;
        for v in decode_rice_chunk(&mut r, count, tau)? {
            prev += v as Offset;
            result.push(prev);
        }
        produced += count;
    }
    Ok(result)
}

fn bits_for_range(range: u64) -> u32 {
    if range == 0 {
        0
    } else {
        64 - range.leading_zeros()
    }
}

pub fn encode_gaps_ip(offsets: &[Offset]) -> Vec<u8> {
    let mut out = Vec::new();
    if offsets.is_empty() {
        return out;
    }
    out.extend_from_slice(&(offsets[0] as u64).to_le_bytes());
    let gaps: Vec<u64> = offsets.windows(2).map(|w| (w[1] - w[0]) as u64).collect();

    for chunk in gaps.chunks(RHO) {
        let min = *chunk.iter().min().unwrap();
        let max = *chunk.iter().max().unwrap();
        let range = max - min;
        let bits = bits_for_range(range);
        let mut w = BitWriter::new();
        for &v in chunk {
            if bits > 0 {
                w.put_bits(v - min, bits);
            }
        }
        let body = w.finish();
        vbyte::put_u64(&mut out, min);
        out.extend_from_slice(&bits.to_le_bytes());
        vbyte::put_u64(&mut out, body.len() as u64);
        out.extend_from_slice(&body);
    }
    out
}

pub fn decode_gaps_ip(buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return Ok(result);
    }
    if buf.len() < 8 {
        return Err(EngineError::corrupted("truncated gubc-ip header"));
    }
    let first = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as Offset;
    result.push(first);
    let mut prev = first;
    let mut pos = 8usize;
    let total_gaps = n - 1;
    let mut produced = 0usize;

    while produced < total_gaps {
        let count = (total_gaps - produced).min(RHO);
        let (min, c1) = vbyte::get_u64(&buf[pos..])?;
        pos += c1;
        if pos + 4 > buf.len() {
            return Err(EngineError::corrupted("truncated gubc-ip chunk bits"));
        }
        let bits = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let (body_len, c2) = vbyte::get_u64(&buf[pos..])?;
        pos += c2;
        let body_len = body_len as usize;
        if pos + body_len > buf.len() {
            return Err(EngineError::corrupted("truncated gubc-ip chunk body"));
        }
        let mut r = BitReader::new(&buf[pos..pos + body_len]);
        pos += body_len;
        for _ in 0..count {
            let delta = if bits > 0 {
                r.get_bits(bits).ok_or_else(|| EngineError::corrupted("truncated gubc-ip value"))?
            } else {
                0
            };
            let v = min + delta;
            prev += v as Offset;
            result.push(prev);
        }
        produced += count;
    }
    Ok(result)
}
