//! Document-at-a-time BM25 ranker (spec §4.6), grounded directly on
//! `BM25Query::processCoreQuery` (original_source/query/bm25query.cpp):
//! per-element IDF weights with a 0.5 floor boost, MaxScore pruning via
//! the weakest term's maximum remaining impact, a top-k heap gate, and
//! an optional term-proximity pass with same-position folding. The
//! "suckers" heuristic generalises the original's single
//! `termWithMinWeight` skip to `sucker_count` weakest terms, each
//! skippable once its own maximum remaining contribution (scaled by
//! `sucker_safety_factor`) can no longer change the current top-k
//! (spec §9 open question, decided in favour of a small configurable
//! count over tracking just one).

use crate::core::config::EngineConfig;
use crate::core::offset::{encode_tf, Offset, MAX_OFFSET};
use crate::postings::{Extent, PostingList};
use crate::scoring::stats::StatsEntry;
use crate::util::heap::TopK;

/// One term (or compound element) contributing to the ranking, with the
/// query-supplied external weight the element's IDF weight gets
/// multiplied by (spec §4.6 step 1; usually `1.0`).
pub struct TermElement {
    pub list: Box<dyn PostingList>,
    pub external_weight: f64,
}

impl TermElement {
    pub fn new(list: Box<dyn PostingList>) -> Self {
        TermElement { list, external_weight: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredExtent {
    pub score: f64,
    pub from: Offset,
    pub to: Offset,
}

// `ScoredExtent` only needs a total order for `TopK`'s internal heap;
// NaN scores never occur since every contribution is a finite ratio of
// non-negative quantities.
impl Eq for ScoredExtent {}
impl PartialOrd for ScoredExtent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredExtent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(self.from.cmp(&other.from))
    }
}

pub struct Bm25Ranker<'a> {
    config: &'a EngineConfig,
}

impl<'a> Bm25Ranker<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Bm25Ranker { config }
    }

    /// Computes each element's internal BM25 weight from its positive
    /// document frequency, with the 0.5 floor boost so very frequent
    /// terms still contribute (spec §4.6 step 1).
    fn term_weights(&self, external: &[f64], df: &[i64], container_count: i64) -> Vec<f64> {
        let mut weights = vec![0.0; external.len()];
        if !self.config.use_idf {
            weights.copy_from_slice(external);
        } else {
            for i in 0..external.len() {
                let d = df[i] as f64;
                weights[i] = if d < 1.0 || d > (container_count - 1) as f64 {
                    0.0
                } else {
                    external[i] * (container_count as f64 / d).ln()
                };
            }
        }
        for w in weights.iter_mut() {
            if *w < 1.0 {
                *w = if *w < 0.0 { 0.5 } else { *w + 0.5 * (1.0 - *w) };
            }
        }
        weights
    }

    /// Ranks `container_list` against `elements`, returning the top `k`
    /// extents sorted by descending score (ties broken by ascending
    /// `from`, per `ScoredExtent`'s `Ord`).
    pub fn rank(
        &self,
        container_list: &mut dyn PostingList,
        mut elements: Vec<TermElement>,
        stats: &StatsEntry,
        df: &[i64],
        k: usize,
    ) -> Vec<ScoredExtent> {
        if elements.is_empty() || k == 0 {
            return Vec::new();
        }
        let external: Vec<f64> = elements.iter().map(|e| e.external_weight).collect();
        let weights = self.term_weights(&external, df, stats.container_count);

        let n = elements.len();
        let mut sorted_weights = weights.clone();
        sorted_weights.sort_by(|a, b| a.partial_cmp(b).unwrap());

        // Indices of the `sucker_count` weakest terms, ascending by weight:
        // these are the candidates the MaxScore pruning loop may skip.
        let mut sucker_order: Vec<usize> = (0..n).collect();
        sucker_order.sort_by(|&a, &b| weights[a].partial_cmp(&weights[b]).unwrap());
        let suckers: Vec<usize> = sucker_order.into_iter().take(self.config.sucker_count).collect();
        let max_impact_of_suckers: Vec<f64> =
            suckers.iter().map(|&i| (self.config.k1 + 1.0) * weights[i] * self.config.sucker_safety_factor).collect();

        let mut next_possible_for_element = vec![MAX_OFFSET; n];
        for (i, e) in elements.iter_mut().enumerate() {
            if let Some(ext) = e.list.first_end_bigger_eq(0) {
                next_possible_for_element[i] = ext.to;
            }
        }

        let mut top_k: TopK<ScoredExtent> = TopK::new(k);
        let mut next_offset_possible: Offset = *next_possible_for_element.iter().min().unwrap_or(&MAX_OFFSET);

        while let Some(container) = container_list.first_end_bigger_eq(next_offset_possible) {
            let dl = (container.to - container.from + 1) as f64;
            let kk = stats.k_for_length(self.config.k1, self.config.b, dl);

            let mut score = 0.0;
            let mut scorers: Vec<(usize, i64)> = Vec::new();
            for i in 0..n {
                if next_possible_for_element[i] > container.to {
                    continue;
                }
                let tf_raw = elements[i].list.count(container.from, container.to);
                if tf_raw > 0 {
                    let tf_code = encode_tf(tf_raw as u32);
                    score += weights[i] * stats.impact_of(self.config.k1, self.config.b, tf_code, dl);
                    scorers.push((i, tf_raw));
                }
                next_possible_for_element[i] = elements[i]
                    .list
                    .first_end_bigger_eq(container.to + 1)
                    .map(|e| e.to)
                    .unwrap_or(MAX_OFFSET);
            }

            next_offset_possible = MAX_OFFSET;
            for i in 0..n {
                if let Some(pos) = suckers.iter().position(|&s| s == i) {
                    if top_k.is_full() {
                        if let Some(min) = top_k.min() {
                            if max_impact_of_suckers[pos] <= min.score {
                                continue;
                            }
                        }
                    }
                }
                if next_possible_for_element[i] < next_offset_possible {
                    next_offset_possible = next_possible_for_element[i];
                }
            }
            if next_offset_possible <= container.to {
                next_offset_possible = container.to + 1;
            }

            if score < 1e-9 {
                continue;
            }

            if self.config.use_proximity && scorers.len() > 1 {
                score += self.proximity_score(&mut elements, &scorers, &weights, container, kk);
            }

            top_k.offer(ScoredExtent { score, from: container.from, to: container.to });
        }

        top_k.into_sorted_desc()
    }

    fn proximity_score(
        &self,
        elements: &mut [TermElement],
        scorers: &[(usize, i64)],
        weights: &[f64],
        container: Extent,
        kk: f64,
    ) -> f64 {
        let mut sorted_w: Vec<f64> = weights.to_vec();
        sorted_w.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let threshold = if weights.len() < 3 {
            sorted_w[sorted_w.len() - 1] - 0.001
        } else {
            sorted_w[2] - 0.001
        };

        let mut occurrences: Vec<(usize, Offset)> = Vec::new();
        for &(i, tf) in scorers {
            let mut buf = Vec::new();
            let cap = (tf as usize).min(4096);
            elements[i].list.next_n(container.from, container.to, cap, &mut buf);
            for e in buf {
                occurrences.push((i, e.from));
            }
        }
        occurrences.sort_by_key(|&(_, pos)| pos);

        let mut proxi_score = vec![0.0; weights.len()];
        let mut previous: Option<(usize, Offset)> = None;
        for &(who, pos) in &occurrences {
            if let Some((prev_who, prev_pos)) = previous {
                if prev_who != who {
                    let distance = (pos - prev_pos) as f64;
                    if distance >= 0.999 {
                        if weights[prev_who] >= threshold {
                            proxi_score[who] += weights[prev_who] / distance.powf(self.config.proximity_q);
                        }
                        if weights[who] >= threshold {
                            proxi_score[prev_who] += weights[who] / distance.powf(self.config.proximity_q);
                        }
                    }
                }
            }
            previous = Some((who, pos));
        }

        let mut total = 0.0;
        for &(i, _) in scorers {
            let p = proxi_score[i];
            total += weights[i].min(1.0) * (self.config.k1 + 1.0) * p / (kk + p);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;

    #[test]
    fn ranks_documents_by_term_overlap() {
        let config = EngineConfig::default();
        // Docs (0,9), (10,19), (20,29): "a" hits doc0+doc2, "b" hits doc2 only.
        let containers = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29)]);
        let a = ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(25, 25)]);
        let b = ArrayList::from_extents(&[Extent::new(26, 26)]);

        let mut container_for_stats = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 19), Extent::new(20, 29)]);
        let mut element_lists: Vec<Box<dyn PostingList>> = vec![
            Box::new(ArrayList::from_extents(&[Extent::new(5, 5), Extent::new(25, 25)])),
            Box::new(ArrayList::from_extents(&[Extent::new(26, 26)])),
        ];
        let (stats, df) = crate::scoring::stats::compute_stats(&config, &mut container_for_stats, &mut element_lists);

        let mut containers_for_rank = containers;
        let ranker = Bm25Ranker::new(&config);
        let elements = vec![TermElement::new(Box::new(a)), TermElement::new(Box::new(b))];
        let results = ranker.rank(&mut containers_for_rank, elements, &stats, &df, 10);

        assert_eq!(results[0].from, 20);
        assert!(results.iter().all(|r| r.from != 10));
    }
}
