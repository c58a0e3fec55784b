//! Cross-module scenarios exercising the full pipeline (postings,
//! operators, visibility, scoring, query driver) together on one
//! synthetic 8-document corpus: `doc_i = (10i, 10i+9)` for `i in 0..8`,
//! term `a` at offsets `{5, 14, 25, 36}`, term `b` at `{6, 20, 35}`.

use std::sync::Arc;

use gcl_core::compression::{compress_block, decompress_block, CodecId};
use gcl_core::core::config::EngineConfig;
use gcl_core::operators::and::And;
use gcl_core::operators::containment::{Containment, Direction};
use gcl_core::operators::sequence::Sequence;
use gcl_core::postings::array::ArrayList;
use gcl_core::postings::{Extent, PostingList};
use gcl_core::query::driver::QueryDriver;
use gcl_core::query::oracle::CachingStatisticsOracle;
use gcl_core::query::oracle::StatisticsOracle;
use gcl_core::scoring::bm25::TermElement;
use gcl_core::visibility::{DocumentType, VisibleEntry, VisibleExtentsTable};

fn containers() -> Vec<Extent> {
    (0..8).map(|i| Extent::new(10 * i, 10 * i + 9)).collect()
}

fn term_a() -> Vec<Extent> {
    vec![Extent::new(5, 5), Extent::new(14, 14), Extent::new(25, 25), Extent::new(36, 36)]
}

fn term_b() -> Vec<Extent> {
    vec![Extent::new(6, 6), Extent::new(20, 20), Extent::new(35, 35)]
}

fn term_c_disjoint() -> Vec<Extent> {
    // Never occurs at all: AND's minimal-passage semantics still yields
    // empty whenever any child has no occurrences, regardless of where
    // the other children's occurrences fall.
    vec![]
}

#[test]
fn scenario_1_bm25_ranks_docs_with_both_terms_highest() {
    let config = EngineConfig { k1: 1.2, b: 0.75, ..EngineConfig::default() };
    let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(8));
    let driver = QueryDriver::new(&config, oracle);

    let elements =
        vec![TermElement::new(Box::new(ArrayList::from_extents(&term_a()))), TermElement::new(Box::new(ArrayList::from_extents(&term_b())))];

    let results = driver
        .run(
            1,
            Box::new(ArrayList::from_extents(&containers())),
            elements,
            || {
                (
                    Box::new(ArrayList::from_extents(&containers())) as Box<dyn PostingList>,
                    vec![
                        Box::new(ArrayList::from_extents(&term_a())) as Box<dyn PostingList>,
                        Box::new(ArrayList::from_extents(&term_b())) as Box<dyn PostingList>,
                    ],
                )
            },
            None,
            true,
            3,
            || false,
        )
        .unwrap();

    assert_eq!(results.len(), 3);
    let extents: Vec<(i64, i64)> = results.iter().map(|r| (r.from, r.to)).collect();
    assert_eq!(extents, vec![(30, 39), (20, 29), (0, 9)]);
    for w in results.windows(2) {
        assert!(w[0].score >= w[1].score);
    }
}

#[test]
fn scenario_2_phrase_sequence_matches_adjacent_tokens() {
    let new_positions = vec![Extent::new(7, 7), Extent::new(22, 22), Extent::new(55, 55)];
    let york_positions = vec![Extent::new(8, 8), Extent::new(23, 23), Extent::new(40, 40)];
    let mut phrase = Sequence::new(vec![
        Box::new(ArrayList::from_extents(&new_positions)),
        Box::new(ArrayList::from_extents(&york_positions)),
    ]);

    let mut matches = Vec::new();
    let mut pos = 0;
    while let Some(e) = phrase.first_start_bigger_eq(pos) {
        matches.push((e.from, e.to));
        pos = e.from + 1;
    }
    assert_eq!(matches, vec![(7, 8), (22, 23)]);
}

#[test]
fn scenario_3_and_with_disjoint_supports_is_empty() {
    let mut conjunction = And::new(vec![
        Box::new(ArrayList::from_extents(&term_a())),
        Box::new(ArrayList::from_extents(&term_b())),
        Box::new(ArrayList::from_extents(&term_c_disjoint())),
    ]);
    assert_eq!(conjunction.first_start_bigger_eq(0), None);
}

#[test]
fn scenario_4_containment_finds_docs_with_both_terms() {
    let mut conjunction =
        And::new(vec![Box::new(ArrayList::from_extents(&term_a())), Box::new(ArrayList::from_extents(&term_b()))]);
    // Materialise AND's extents first: Containment needs two independent
    // cursors and AND is itself stateful, so it can't be driven twice.
    let mut and_extents = Vec::new();
    let mut pos = 0;
    while let Some(e) = conjunction.first_start_bigger_eq(pos) {
        and_extents.push(e);
        pos = e.from + 1;
    }

    let mut containment = Containment::new(
        Box::new(ArrayList::from_extents(&containers())),
        Box::new(ArrayList::from_extents(&and_extents)),
        Direction::Contains,
        false,
    );
    let mut docs = Vec::new();
    let mut pos = 0;
    while let Some(e) = containment.first_start_bigger_eq(pos) {
        docs.push((e.from, e.to));
        pos = e.from + 1;
    }
    assert_eq!(docs, vec![(0, 9), (20, 29), (30, 39)]);
}

#[test]
fn scenario_5_security_suppresses_docs_outside_visible_set() {
    let config = EngineConfig { k1: 1.2, b: 0.75, ..EngineConfig::default() };
    let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(8));
    let driver = QueryDriver::new(&config, oracle);

    let visible = VisibleExtentsTable::new(vec![
        VisibleEntry { file_id: 0, start_offset: 0, token_count: 10, document_type: DocumentType::Text },
        VisibleEntry { file_id: 2, start_offset: 20, token_count: 10, document_type: DocumentType::Text },
    ]);

    let elements =
        vec![TermElement::new(Box::new(ArrayList::from_extents(&term_a()))), TermElement::new(Box::new(ArrayList::from_extents(&term_b())))];

    let results = driver
        .run(
            1,
            Box::new(ArrayList::from_extents(&containers())),
            elements,
            || {
                (
                    Box::new(ArrayList::from_extents(&containers())) as Box<dyn PostingList>,
                    vec![
                        Box::new(ArrayList::from_extents(&term_a())) as Box<dyn PostingList>,
                        Box::new(ArrayList::from_extents(&term_b())) as Box<dyn PostingList>,
                    ],
                )
            },
            Some(visible),
            false,
            3,
            || false,
        )
        .unwrap();

    let extents: Vec<(i64, i64)> = results.iter().map(|r| (r.from, r.to)).collect();
    assert!(extents.contains(&(0, 9)));
    assert!(extents.contains(&(20, 29)));
    assert!(!extents.contains(&(30, 39)));
}

#[test]
fn scenario_6_every_codec_round_trips_the_boundary_values() {
    let offsets: Vec<i64> = vec![0, 127, 128, 16383, 16384, 1i64 << 32, 1i64 << 40, (1i64 << 47) - 1];
    let codecs = [
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
    for codec in codecs {
        let frame = compress_block(codec, &offsets, false);
        let decoded = decompress_block(&frame).unwrap_or_else(|e| panic!("{codec:?} failed to decode: {e}"));
        assert_eq!(decoded.offsets, offsets, "{codec:?} round-trip mismatch");
    }
}
