use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gcl_core::core::config::EngineConfig;
use gcl_core::postings::array::ArrayList;
use gcl_core::postings::{Extent, PostingList};
use gcl_core::scoring::bm25::{Bm25Ranker, TermElement};
use gcl_core::scoring::stats::compute_stats;
use rand::Rng;

fn synth_corpus(doc_count: i64, doc_len: i64) -> (Vec<Extent>, Vec<Extent>, Vec<Extent>) {
    let mut rng = rand::thread_rng();
    let mut containers = Vec::with_capacity(doc_count as usize);
    let mut term_a = Vec::new();
    let mut term_b = Vec::new();
    let mut pos = 0i64;
    for _ in 0..doc_count {
        let start = pos;
        let end = pos + doc_len - 1;
        containers.push(Extent::new(start, end));
        for p in start..=end {
            if rng.gen_bool(0.1) {
                term_a.push(Extent::new(p, p));
            }
            if rng.gen_bool(0.03) {
                term_b.push(Extent::new(p, p));
            }
        }
        pos = end + 1;
    }
    (containers, term_a, term_b)
}

fn bench_rank(c: &mut Criterion) {
    let config = EngineConfig::default();
    let (containers, term_a, term_b) = synth_corpus(2000, 200);

    c.bench_function("bm25_rank_2000_docs", |b| {
        b.iter(|| {
            let mut stats_containers = ArrayList::from_extents(&containers);
            let mut stats_elements: Vec<Box<dyn PostingList>> =
                vec![Box::new(ArrayList::from_extents(&term_a)), Box::new(ArrayList::from_extents(&term_b))];
            let (stats, df) = compute_stats(&config, &mut stats_containers, &mut stats_elements);

            let mut rank_containers = ArrayList::from_extents(&containers);
            let elements = vec![
                TermElement::new(Box::new(ArrayList::from_extents(&term_a))),
                TermElement::new(Box::new(ArrayList::from_extents(&term_b))),
            ];
            let ranker = Bm25Ranker::new(&config);
            black_box(ranker.rank(&mut rank_containers, elements, &stats, &df, 10));
        });
    });
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
