//! Collection statistics (spec §4.5), grounded on the preview-scan loop
//! in `BM25Query::processCoreQuery` (original_source/query/bm25query.cpp):
//! containers are walked in batches rather than one `getNextN` call per
//! container, and each query element's own "next possible position" is
//! tracked so an element whose next occurrence is already past the
//! current container doesn't need to be re-queried for every container
//! in between.

use crate::core::config::EngineConfig;
use crate::core::offset::{decode_tf, MAX_OFFSET};
use crate::postings::PostingList;

const PREVIEW: usize = 64;

/// Per-container-set collection statistics, cached behind a fingerprint
/// of `(container, k1, b)` (spec §4.4/§4.5).
#[derive(Debug, Clone)]
pub struct StatsEntry {
    pub container_count: i64,
    pub avg_container_length: f64,
    /// `dl_shift` such that `avg_container_length as u64 >> dl_shift <= 512`;
    /// used to bucket document lengths into a manageable impact table.
    pub dl_shift: u32,
    /// `impact[shifted_dl][tf_code] = (k1+1) * decode_tf(tf_code) / (K + decode_tf(tf_code))`,
    /// `K = k1 * ((1-b) + b * (shifted_dl << dl_shift) / avg_container_length)`.
    /// Indexed `[0..=max_cached_shifted_dl][0..=max_cached_tf]`.
    impact: Vec<Vec<f64>>,
    max_cached_shifted_dl: u32,
    max_cached_tf: u32,
}

impl StatsEntry {
    /// BM25 per-document K normaliser: `k1 * ((1-b) + b * dl / avgdl)`.
    pub fn k_for_length(&self, k1: f64, b: f64, container_length: f64) -> f64 {
        k1 * ((1.0 - b) + b * container_length / self.avg_container_length.max(1.0))
    }

    /// Impact contribution of a quantised term frequency at a given raw
    /// document length, looking up the precomputed table when in range
    /// and falling back to a direct computation otherwise.
    pub fn impact_of(&self, k1: f64, b: f64, tf_code: u32, container_length: f64) -> f64 {
        let shifted_dl = ((container_length as u64) >> self.dl_shift) as u32;
        if shifted_dl <= self.max_cached_shifted_dl && tf_code <= self.max_cached_tf {
            return self.impact[shifted_dl as usize][tf_code as usize];
        }
        let k = self.k_for_length(k1, b, container_length);
        let tf = decode_tf(tf_code) as f64;
        (k1 + 1.0) * tf / (k + tf)
    }
}

fn choose_dl_shift(avg_container_length: f64) -> u32 {
    let mut shift = 0u32;
    while ((avg_container_length as u64) >> shift) > 512 {
        shift += 1;
    }
    shift
}

fn build_impact_table(config: &EngineConfig, avg_container_length: f64, dl_shift: u32) -> Vec<Vec<f64>> {
    let rows = config.max_cached_shifted_dl as usize + 1;
    let cols = config.max_cached_tf as usize + 1;
    let mut table = vec![vec![0.0; cols]; rows];
    for (shifted_dl, row) in table.iter_mut().enumerate() {
        let dl = ((shifted_dl as u64) << dl_shift) as f64;
        let k = config.k1 * ((1.0 - config.b) + config.b * dl / avg_container_length.max(1.0));
        for (tf_code, cell) in row.iter_mut().enumerate() {
            let tf = decode_tf(tf_code as u32) as f64;
            *cell = (config.k1 + 1.0) * tf / (k + tf);
        }
    }
    table
}

/// Scans `container_list` once, computing `container_count` and
/// `avg_container_length`, and simultaneously computes each element's
/// positive document frequency (the number of containers holding at
/// least one occurrence of that element) by co-scanning `element_lists`
/// in lockstep. Returns `(StatsEntry, per_element_df)`.
pub fn compute_stats(
    config: &EngineConfig,
    container_list: &mut dyn PostingList,
    element_lists: &mut [Box<dyn PostingList>],
) -> (StatsEntry, Vec<i64>) {
    let n = element_lists.len();
    let mut df = vec![0i64; n];
    let mut next_possible_for_element = vec![MAX_OFFSET; n];
    for (i, list) in element_lists.iter_mut().enumerate() {
        if let Some(e) = list.first_end_bigger_eq(0) {
            next_possible_for_element[i] = e.to;
        }
    }

    let mut container_count: i64 = 0;
    let mut total_length: f64 = 0.0;
    let mut next_possible: i64 = 0;

    let mut preview = Vec::with_capacity(PREVIEW);
    let mut cursor = 0i64;
    loop {
        preview.clear();
        let got = container_list.next_n(cursor, MAX_OFFSET, PREVIEW, &mut preview);
        if got == 0 {
            break;
        }
        for c in &preview {
            total_length += (c.to - c.from + 1) as f64;
            container_count += 1;
            if c.to >= next_possible {
                next_possible = MAX_OFFSET;
                for i in 0..n {
                    if next_possible_for_element[i] <= c.to {
                        match element_lists[i].first_start_bigger_eq(c.from) {
                            Some(e) if e.to <= c.to => {
                                df[i] += 1;
                                next_possible_for_element[i] = e.to;
                            }
                            Some(e) => next_possible_for_element[i] = e.to,
                            None => next_possible_for_element[i] = MAX_OFFSET,
                        }
                    }
                    if next_possible_for_element[i] < next_possible {
                        next_possible = next_possible_for_element[i];
                    }
                }
            }
        }
        cursor = preview.last().unwrap().from + 1;
        if got < PREVIEW {
            break;
        }
    }

    let avg_container_length = if container_count > 0 { total_length / container_count as f64 } else { 0.0 };
    let dl_shift = choose_dl_shift(avg_container_length);
    let impact = build_impact_table(config, avg_container_length, dl_shift);

    (
        StatsEntry {
            container_count,
            avg_container_length,
            dl_shift,
            impact,
            max_cached_shifted_dl: config.max_cached_shifted_dl,
            max_cached_tf: config.max_cached_tf,
        },
        df,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::array::ArrayList;
    use crate::postings::Extent;

    #[test]
    fn counts_containers_and_average_length() {
        let config = EngineConfig::default();
        let mut containers = ArrayList::from_extents(&[Extent::new(0, 9), Extent::new(10, 29)]);
        let a = ArrayList::from_extents(&[Extent::new(5, 5)]);
        let mut elements: Vec<Box<dyn PostingList>> = vec![Box::new(a)];
        let (stats, df) = compute_stats(&config, &mut containers, &mut elements);
        assert_eq!(stats.container_count, 2);
        assert_eq!(stats.avg_container_length, 15.0);
        assert_eq!(df, vec![1]);
    }

    #[test]
    fn impact_decreases_with_longer_documents() {
        let config = EngineConfig::default();
        let mut containers = ArrayList::from_extents(&[Extent::new(0, 99), Extent::new(100, 199)]);
        let mut elements: Vec<Box<dyn PostingList>> = vec![];
        let (stats, _) = compute_stats(&config, &mut containers, &mut elements);
        let short = stats.impact_of(config.k1, config.b, 4, 50.0);
        let long = stats.impact_of(config.k1, config.b, 4, 500.0);
        assert!(short > long);
    }
}
