//! The framed posting-block container (spec §3): every compressed block
//! is self-describing — a tag byte (codec id in the low 7 bits, a
//! fast-path flag in the high bit), a vByte-encoded posting count, and
//! the codec's own payload. Any codec module in this tree can be
//! selected per block, so a single segment can mix codecs across blocks
//! without a global format switch.

pub mod bits;
pub mod delta;
pub mod gamma;
pub mod golomb;
pub mod groupvarint;
pub mod gubc;
pub mod huffman;
pub mod interpolative;
pub mod llrun;
pub mod none;
pub mod pfor;
pub mod rice;
pub mod simple9;
pub mod vbyte;

use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;

/// Stable on-disk identifiers; never renumber an existing variant once a
/// segment using it has shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodecId {
    VByte = 0,
    Gamma = 1,
    Delta = 2,
    Golomb = 3,
    Rice = 4,
    Simple9 = 5,
    GroupVarInt = 6,
    PForDelta = 7,
    LlRun = 8,
    LlRunMulti = 9,
    Gubc = 10,
    GubcIp = 11,
    HuffmanDirect = 12,
    Huffman2 = 13,
    Interpolative = 14,
    None = 15,
}

impl CodecId {
    fn from_u8(v: u8) -> EngineResult<Self> {
        Ok(match v {
            0 => CodecId::VByte,
            1 => CodecId::Gamma,
            2 => CodecId::Delta,
            3 => CodecId::Golomb,
            4 => CodecId::Rice,
            5 => CodecId::Simple9,
            6 => CodecId::GroupVarInt,
            7 => CodecId::PForDelta,
            8 => CodecId::LlRun,
            9 => CodecId::LlRunMulti,
            10 => CodecId::Gubc,
            11 => CodecId::GubcIp,
            12 => CodecId::HuffmanDirect,
            13 => CodecId::Huffman2,
            14 => CodecId::Interpolative,
            15 => CodecId::None,
            other => return Err(EngineError::corrupted(format!("unknown codec id {other}"))),
        })
    }

    fn encode(self, offsets: &[Offset]) -> Vec<u8> {
        match self {
            CodecId::VByte => vbyte::encode_gaps(offsets),
            CodecId::Gamma => gamma::encode_gaps(offsets),
            CodecId::Delta => delta::encode_gaps(offsets),
            CodecId::Golomb => golomb::encode_gaps(offsets),
            CodecId::Rice => rice::encode_gaps(offsets),
            CodecId::Simple9 => simple9::encode_gaps(offsets),
            CodecId::GroupVarInt => groupvarint::encode_gaps(offsets),
            CodecId::PForDelta => pfor::encode_gaps(offsets),
            CodecId::LlRun => llrun::encode_gaps(offsets),
            CodecId::LlRunMulti => llrun::encode_gaps_multi(offsets),
            CodecId::Gubc => gubc::encode_gaps(offsets),
            CodecId::GubcIp => gubc::encode_gaps_ip(offsets),
            CodecId::HuffmanDirect => huffman::encode_gaps(offsets),
            CodecId::Huffman2 => huffman::encode_gaps_v2(offsets),
            CodecId::Interpolative => interpolative::encode_gaps(offsets),
            CodecId::None => none::encode_gaps(offsets),
        }
    }

    fn decode(self, buf: &[u8], n: usize) -> EngineResult<Vec<Offset>> {
        match self {
            CodecId::VByte => vbyte::decode_gaps(buf, n),
            CodecId::Gamma => gamma::decode_gaps(buf, n),
            CodecId::Delta => delta::decode_gaps(buf, n),
            CodecId::Golomb => golomb::decode_gaps(buf, n),
            CodecId::Rice => rice::decode_gaps(buf, n),
            CodecId::Simple9 => simple9::decode_gaps(buf, n),
            CodecId::GroupVarInt => groupvarint::decode_gaps(buf, n),
            CodecId::PForDelta => pfor::decode_gaps(buf, n),
            CodecId::LlRun => llrun::decode_gaps(buf, n),
            CodecId::LlRunMulti => llrun::decode_gaps_multi(buf, n),
            CodecId::Gubc => gubc::decode_gaps(buf, n),
            CodecId::GubcIp => gubc::decode_gaps_ip(buf, n),
            CodecId::HuffmanDirect => huffman::decode_gaps(buf, n),
            CodecId::Huffman2 => huffman::decode_gaps_v2(buf, n),
            CodecId::Interpolative => interpolative::decode_gaps(buf, n),
            CodecId::None => none::decode_gaps(buf, n),
        }
    }
}

const FAST_PATH_FLAG: u8 = 0x80;

/// Encodes `offsets` (already absolute, ascending) as one framed block.
/// `fast_path` should be set when every gap is known to fit in a single
/// byte, letting a reader skip straight to a byte-aligned scan instead of
/// invoking the codec's general decoder.
pub fn compress_block(codec: CodecId, offsets: &[Offset], fast_path: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let tag = codec as u8 | if fast_path { FAST_PATH_FLAG } else { 0 };
    out.push(tag);
    vbyte::put_u64(&mut out, offsets.len() as u64);
    out.extend_from_slice(&codec.encode(offsets));
    out
}

pub struct DecodedBlock {
    pub codec: CodecId,
    pub fast_path: bool,
    pub offsets: Vec<Offset>,
}

pub fn decompress_block(buf: &[u8]) -> EngineResult<DecodedBlock> {
    if buf.is_empty() {
        return Err(EngineError::corrupted("empty compressed block"));
    }
    let tag = buf[0];
    let codec = CodecId::from_u8(tag & 0x7F)?;
    let fast_path = tag & FAST_PATH_FLAG != 0;
    let (count, consumed) = vbyte::get_u64(&buf[1..])?;
    let payload = &buf[1 + consumed..];
    let offsets = codec.decode(payload, count as usize)?;
    Ok(DecodedBlock { codec, fast_path, offsets })
}

/// Produces a new vByte-coded frame representing the concatenation of
/// the postings in `a` followed by the postings in `b`. Either input may
/// use any codec; both are fully decoded to absolute offsets first, so
/// the merge itself never has to understand more than one format at a
/// time (spec §3: "mergeCompressed... conceptually re-encodes to vByte").
/// `last_in_a` is the caller's expectation of `a`'s final offset and is
/// checked rather than trusted, since a mismatch means the two blocks
/// are not actually adjacent in the same list.
pub fn merge_compressed(a: &[u8], b: &[u8], last_in_a: Offset) -> EngineResult<Vec<u8>> {
    let da = decompress_block(a)?;
    let db = decompress_block(b)?;
    if let Some(&actual_last) = da.offsets.last() {
        if actual_last != last_in_a {
            return Err(EngineError::corrupted("merge_compressed: last_in_a does not match block a"));
        }
    }
    let mut combined = da.offsets;
    combined.extend(db.offsets);
    Ok(compress_block(CodecId::VByte, &combined, all_gaps_fit_byte(&combined)))
}

fn all_gaps_fit_byte(offsets: &[Offset]) -> bool {
    vbyte::all_gaps_fit_one_byte(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CODECS: [CodecId; 16] = [
        CodecId::VByte,
        CodecId::Gamma,
        CodecId::Delta,
        CodecId::Golomb,
        CodecId::Rice,
        CodecId::Simple9,
        CodecId::GroupVarInt,
        CodecId::PForDelta,
        CodecId::LlRun,
        CodecId::LlRunMulti,
        CodecId::Gubc,
        CodecId::GubcIp,
        CodecId::HuffmanDirect,
        CodecId::Huffman2,
        CodecId::Interpolative,
        CodecId::None,
    ];

    #[test]
    fn every_codec_round_trips_through_the_frame() {
        let xs: Vec<Offset> = vec![10, 11, 15, 1000, 1001, 1002, 5_000_000, 5_000_003, 1 << 40];
        for &codec in &ALL_CODECS {
            let frame = compress_block(codec, &xs, false);
            let decoded = decompress_block(&frame).unwrap();
            assert_eq!(decoded.codec, codec);
            assert_eq!(decoded.offsets, xs, "codec {codec:?} round-trip mismatch");
        }
    }

    #[test]
    fn merge_compressed_concatenates_in_order() {
        let a = vec![1, 2, 3];
        let b = vec![10, 11];
        let frame_a = compress_block(CodecId::Gamma, &a, false);
        let frame_b = compress_block(CodecId::Simple9, &b, false);
        let merged = merge_compressed(&frame_a, &frame_b, 3).unwrap();
        let decoded = decompress_block(&merged).unwrap();
        assert_eq!(decoded.offsets, vec![1, 2, 3, 10, 11]);
    }

    #[test]
    fn merge_compressed_rejects_mismatched_last_in_a() {
        let a = vec![1, 2, 3];
        let b = vec![10, 11];
        let frame_a = compress_block(CodecId::VByte, &a, false);
        let frame_b = compress_block(CodecId::VByte, &b, false);
        assert!(merge_compressed(&frame_a, &frame_b, 99).is_err());
    }
}
