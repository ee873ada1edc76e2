//! Latency percentile computation over a window of leg latencies (spec.md
//! §4.9): exact below a row-count threshold, a bucketed approximation
//! above it. The approximation is only acceptable because spec.md §4.9
//! tolerates p50/p95 within ±1 bucket of the exact value — widen
//! `bucket_ms` and that tolerance widens with it.

use serde::{Deserialize, Serialize};

/// Below this many samples, percentiles are computed by an exact sort
/// (cheap at this scale, matches `fulcrum_core::LatencyAggregate`'s
/// per-run computation).
pub const EXACT_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    pub count: usize,
    pub p50_ms: i64,
    pub p95_ms: i64,
    /// `true` when computed from the bucketed approximation rather than
    /// an exact sort.
    pub approximate: bool,
}

/// Computes p50/p95 over `latencies_ms`. Exact (full sort) below
/// [`EXACT_THRESHOLD`] samples; above it, a histogram keyed by
/// `bucket_ms`-wide buckets approximates the same percentiles by counting
/// up from bucket zero until the target rank is reached.
pub fn percentiles(latencies_ms: &[i64], bucket_ms: i64) -> Option<LatencyPercentiles> {
    if latencies_ms.is_empty() {
        return None;
    }

    if latencies_ms.len() <= EXACT_THRESHOLD {
        let mut sorted = latencies_ms.to_vec();
        sorted.sort_unstable();
        let rank = |p: f64| -> i64 {
            let index = (((sorted.len() - 1) as f64) * p).round() as usize;
            sorted[index.min(sorted.len() - 1)]
        };
        return Some(LatencyPercentiles { count: sorted.len(), p50_ms: rank(0.50), p95_ms: rank(0.95), approximate: false });
    }

    Some(bucketed_percentiles(latencies_ms, bucket_ms))
}

fn bucketed_percentiles(latencies_ms: &[i64], bucket_ms: i64) -> LatencyPercentiles {
    use std::collections::BTreeMap;

    let bucket_ms = bucket_ms.max(1);
    let mut histogram: BTreeMap<i64, u64> = BTreeMap::new();
    for &latency in latencies_ms {
        *histogram.entry(latency / bucket_ms).or_insert(0) += 1;
    }

    let count = latencies_ms.len();
    let rank_at = |p: f64| -> i64 {
        let target_rank = (((count - 1) as f64) * p).round() as u64;
        let mut seen = 0u64;
        for (&bucket, &bucket_count) in &histogram {
            seen += bucket_count;
            if seen > target_rank {
                return bucket * bucket_ms;
            }
        }
        histogram.keys().next_back().copied().unwrap_or(0) * bucket_ms
    };

    LatencyPercentiles { count, p50_ms: rank_at(0.50), p95_ms: rank_at(0.95), approximate: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_below_threshold_matches_a_hand_sorted_percentile() {
        let latencies: Vec<i64> = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        let result = percentiles(&latencies, 10).unwrap();
        assert!(!result.approximate);
        assert_eq!(result.p50_ms, 60);
        assert_eq!(result.p95_ms, 100);
    }

    #[test]
    fn bucketed_approximation_is_within_one_bucket_of_exact() {
        let latencies: Vec<i64> = (0..20_000).map(|i| i % 500).collect();
        let bucket_ms = 10;

        let mut exact_sorted = latencies.clone();
        exact_sorted.sort_unstable();
        let exact_p50 = exact_sorted[exact_sorted.len() / 2];
        let exact_p95 = exact_sorted[(exact_sorted.len() as f64 * 0.95) as usize];

        let approx = bucketed_percentiles(&latencies, bucket_ms);
        assert!(approx.approximate);
        assert!((approx.p50_ms - exact_p50).abs() <= bucket_ms);
        assert!((approx.p95_ms - exact_p95).abs() <= bucket_ms);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(percentiles(&[], 10).is_none());
    }
}
