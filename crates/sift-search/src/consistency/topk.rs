//! Top-k membership consistency.

use sift_core::RankedList;
use sift_core::config::ConsistencyCutoff;
use std::collections::{BTreeSet, HashMap};

/// Order-insensitive agreement of the K lists' top-k id sets, in `[0, 1]`.
///
/// Every id seen in `c > 1` of the top-k slices adds `sqrt(c - 1)`; the sum
/// is divided by `k' * sqrt(K - 1)`, the value reached when all slices hold
/// the same ids. `k'` is `k` capped at the longest slice, so lists shorter
/// than `k` can still agree fully. Ids repeated inside one slice count once.
///
/// Fewer than two lists, `k == 0`, or all-empty lists return `1.0`.
#[must_use]
pub fn consistency_top_k(lists: &[RankedList], k: usize) -> f64 {
    let num_lists = lists.len();
    if num_lists < 2 || k == 0 {
        return 1.0;
    }

    let mut counts: HashMap<u32, usize> = HashMap::new();
    let mut longest_slice = 0;
    for list in lists {
        let slice: BTreeSet<u32> = list.iter().take(k).map(|c| c.id).collect();
        longest_slice = longest_slice.max(slice.len());
        for id in slice {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    if longest_slice == 0 {
        return 1.0;
    }

    let score: f64 = counts
        .values()
        .filter(|&&c| c > 1)
        .map(|&c| ((c - 1) as f64).sqrt())
        .sum();
    let max = longest_slice as f64 * ((num_lists - 1) as f64).sqrt();
    (score / max).clamp(0.0, 1.0)
}

/// Weighted sum of [`consistency_top_k`] over several cutoffs.
///
/// The default cutoffs are `k = 10` at weight 0.7 and `k = 20` at 0.3,
/// favoring agreement at the tighter cutoff.
#[must_use]
pub fn weighted_consistency_top_k(lists: &[RankedList], cutoffs: &[ConsistencyCutoff]) -> f64 {
    cutoffs
        .iter()
        .map(|cutoff| cutoff.weight * consistency_top_k(lists, cutoff.k))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::Candidate;
    use sift_core::config::EvaluationConfig;

    fn list(ids: impl IntoIterator<Item = u32>) -> RankedList {
        ids.into_iter().map(|id| Candidate::new(id, 0.5)).collect()
    }

    fn assert_approx_eq(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "actual ({actual}) != expected ({expected})"
        );
    }

    #[test]
    fn identical_top_sets_score_one_regardless_of_order() {
        let lists = [list([1, 2, 3, 9]), list([3, 2, 1, 8]), list([2, 3, 1, 7])];
        assert_approx_eq(consistency_top_k(&lists, 3), 1.0);
    }

    #[test]
    fn disjoint_top_sets_score_zero() {
        let lists = [list([1, 2]), list([3, 4]), list([5, 6])];
        assert_approx_eq(consistency_top_k(&lists, 2), 0.0);
    }

    #[test]
    fn partial_overlap_is_between() {
        // Id 1 appears in both slices: sqrt(1) / (2 * sqrt(1)).
        let lists = [list([1, 2]), list([1, 3])];
        assert_approx_eq(consistency_top_k(&lists, 2), 0.5);
    }

    #[test]
    fn recurrence_uses_square_root_credit() {
        // Id 1 in all three slices: sqrt(2); ids 2 and 3 unique.
        let lists = [list([1, 2]), list([1, 3]), list([1, 4])];
        let expected = 2.0_f64.sqrt() / (2.0 * 2.0_f64.sqrt());
        assert_approx_eq(consistency_top_k(&lists, 2), expected);
    }

    #[test]
    fn degenerate_inputs_agree_trivially() {
        assert_approx_eq(consistency_top_k(&[], 10), 1.0);
        assert_approx_eq(consistency_top_k(&[list([1, 2])], 10), 1.0);
        assert_approx_eq(consistency_top_k(&[list([1]), list([2])], 0), 1.0);
        assert_approx_eq(consistency_top_k(&[Vec::new(), Vec::new()], 5), 1.0);
    }

    #[test]
    fn short_lists_can_fully_agree() {
        let lists = [list([4, 5]), list([5, 4])];
        assert_approx_eq(consistency_top_k(&lists, 10), 1.0);
    }

    #[test]
    fn repeated_id_in_one_slice_counts_once() {
        let lists = [list([1, 1]), list([2, 3])];
        assert_approx_eq(consistency_top_k(&lists, 2), 0.0);
    }

    #[test]
    fn weighted_cutoffs_blend_scores() {
        // Top 10 identical, positions 11..20 disjoint.
        let a = list((1..=10).chain(100..110));
        let b = list((1..=10).chain(200..210));
        let lists = [a, b];
        let cutoffs = EvaluationConfig::default().consistency_cutoffs;

        assert_approx_eq(consistency_top_k(&lists, 10), 1.0);
        assert_approx_eq(consistency_top_k(&lists, 20), 0.5);
        assert_approx_eq(weighted_consistency_top_k(&lists, &cutoffs), 0.85);
    }
}
