use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gcl_core::compression::{compress_block, decompress_block, CodecId};
use rand::Rng;

const CODECS: [CodecId; 16] = [
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

fn synth_offsets(n: usize, avg_gap: i64) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(n);
    let mut pos = 0i64;
    for _ in 0..n {
        pos += rng.gen_range(1..=avg_gap.max(1) * 2);
        out.push(pos);
    }
    out
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_encode");
    let offsets = synth_offsets(4096, 12);
    for codec in CODECS {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{codec:?}")), &codec, |b, &codec| {
            b.iter(|| compress_block(codec, black_box(&offsets), false));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_decode");
    let offsets = synth_offsets(4096, 12);
    for codec in CODECS {
        let frame = compress_block(codec, &offsets, false);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{codec:?}")), &frame, |b, frame| {
            b.iter(|| decompress_block(black_box(frame)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
