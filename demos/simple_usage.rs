//! Walks the engine end to end: build postings for a tiny corpus, combine
//! them with the operator algebra, rank with BM25 through the query
//! driver, then show the same query again restricted to one user's
//! visible extents.

use std::sync::Arc;

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
use gcl_core::visibility::{restrict, DocumentType, VisibleEntry, VisibleExtentsTable};

fn docs() -> Vec<Extent> {
    vec![Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29), Extent::new(30, 39)]
}

fn term_a() -> Vec<Extent> {
    vec![Extent::new(5, 5), Extent::new(14, 14), Extent::new(25, 25), Extent::new(36, 36)]
}

fn term_b() -> Vec<Extent> {
    vec![Extent::new(6, 6), Extent::new(20, 20), Extent::new(35, 35)]
}

fn main() {
    println!("== operator algebra ==");
    let mut conjunction = And::new(vec![
        Box::new(ArrayList::from_extents(&term_a())),
        Box::new(ArrayList::from_extents(&term_b())),
    ]);
    println!("AND(a, b) first minimal passage: {:?}", conjunction.first_start_bigger_eq(0));

    let new_positions = vec![Extent::new(7, 7), Extent::new(22, 22), Extent::new(55, 55)];
    let york_positions = vec![Extent::new(8, 8), Extent::new(23, 23), Extent::new(40, 40)];
    let mut phrase = Sequence::new(vec![
        Box::new(ArrayList::from_extents(&new_positions)),
        Box::new(ArrayList::from_extents(&york_positions)),
    ]);
    println!("Sequence(new, york) first match: {:?}", phrase.first_start_bigger_eq(0));

    println!("\n== ranking ==");
    let config = EngineConfig::default();
    let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(16));
    let driver = QueryDriver::new(&config, oracle);

    let elements = vec![
        TermElement::new(Box::new(ArrayList::from_extents(&term_a()))),
        TermElement::new(Box::new(ArrayList::from_extents(&term_b()))),
    ];
    let results = driver
        .run(
            1,
            Box::new(ArrayList::from_extents(&docs())),
            elements,
            || {
                (
                    Box::new(ArrayList::from_extents(&docs())) as Box<dyn PostingList>,
                    vec![
                        Box::new(ArrayList::from_extents(&term_a())) as Box<dyn PostingList>,
                        Box::new(ArrayList::from_extents(&term_b())) as Box<dyn PostingList>,
                    ],
                )
            },
            None,
            true,
            10,
            || false,
        )
        .expect("ranking with god bypass cannot fail visibility check");
    for r in &results {
        println!("doc ({}, {}) scored {:.4}", r.from, r.to, r.score);
    }

    println!("\n== visibility-restricted ranking ==");
    let visible = VisibleExtentsTable::new(vec![
        VisibleEntry { file_id: 0, start_offset: 0, token_count: 10, document_type: DocumentType::Text },
        VisibleEntry { file_id: 2, start_offset: 20, token_count: 10, document_type: DocumentType::Text },
    ]);
    let elements = vec![
        TermElement::new(Box::new(ArrayList::from_extents(&term_a()))),
        TermElement::new(Box::new(ArrayList::from_extents(&term_b()))),
    ];
    let restricted = driver
        .run(
            1,
            Box::new(ArrayList::from_extents(&docs())),
            elements,
            || {
                (
                    Box::new(ArrayList::from_extents(&docs())) as Box<dyn PostingList>,
                    vec![
                        Box::new(ArrayList::from_extents(&term_a())) as Box<dyn PostingList>,
                        Box::new(ArrayList::from_extents(&term_b())) as Box<dyn PostingList>,
                    ],
                )
            },
            Some(visible.clone()),
            false,
            10,
            || false,
        )
        .expect("visible extents were supplied");
    for r in &restricted {
        println!("doc ({}, {}) scored {:.4} (user only sees docs 0 and 2)", r.from, r.to, r.score);
    }

    let mut containment = restrict(visible, Box::new(ArrayList::from_extents(&docs())));
    println!(
        "\nContainment(Security(visible), docs, Contains) first doc: {:?}",
        containment.first_start_bigger_eq(0)
    );

    let mut docs_containing_a = Containment::new(
        Box::new(ArrayList::from_extents(&docs())),
        Box::new(ArrayList::from_extents(&term_a())),
        Direction::Contains,
        false,
    );
    println!("Containment(docs, a, Contains) first doc: {:?}", docs_containing_a.first_start_bigger_eq(0));
}
