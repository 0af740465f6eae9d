//! Weighted pairwise mean squared error between variant scores.

use crate::consistency::{ensure_same_id_sets, positions, rank_weight};
use sift_core::{RankedList, SiftError};

/// Numeric disagreement of K scored rankings over the same ids, in `[0, 1]`.
///
/// For every id and every unordered pair of lists `(i, j)` the squared score
/// difference is weighted by `exp(-min(rank_i, rank_j) / decay_rate)`. The
/// weighted average is divided by `ceiling` (an empirical bound, 0.25 by
/// default) and clamped. Lower is better.
///
/// Fewer than two lists or empty lists return `0.0`.
///
/// # Errors
///
/// Returns [`SiftError::RankingSetMismatch`] if the lists do not cover
/// identical id sets.
pub fn weighted_pairwise_mse(
    lists: &[RankedList],
    decay_rate: f64,
    ceiling: f64,
) -> Result<f64, SiftError> {
    if lists.len() < 2 {
        return Ok(0.0);
    }
    ensure_same_id_sets(lists)?;

    let lookups: Vec<_> = lists.iter().map(|l| positions(l)).collect();

    let mut weighted_error = 0.0;
    let mut total_weight = 0.0;
    for candidate in &lists[0] {
        let entries: Vec<(usize, f64)> = lookups
            .iter()
            .filter_map(|lookup| lookup.get(&candidate.id).copied())
            .collect();

        for (i, &(rank_i, score_i)) in entries.iter().enumerate() {
            for &(rank_j, score_j) in &entries[i + 1..] {
                let weight = rank_weight(rank_i.min(rank_j), decay_rate);
                weighted_error += weight * (score_i - score_j).powi(2);
                total_weight += weight;
            }
        }
    }

    if total_weight <= 0.0 {
        return Ok(0.0);
    }
    Ok((weighted_error / total_weight / ceiling).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::Candidate;

    const DECAY: f64 = 20.0;
    const CEILING: f64 = 0.25;

    fn scored(pairs: &[(u32, f64)]) -> RankedList {
        pairs.iter().copied().map(Candidate::from).collect()
    }

    #[test]
    fn identical_scores_have_no_error() {
        let a = scored(&[(1, 0.9), (2, 0.5), (3, 0.1)]);
        let mse = weighted_pairwise_mse(&[a.clone(), a.clone(), a], DECAY, CEILING).expect("ids");
        assert!(mse.abs() < f64::EPSILON);
    }

    #[test]
    fn matches_hand_computation() {
        let a = scored(&[(1, 0.9), (2, 0.5), (3, 0.1)]);
        let b = scored(&[(1, 0.8), (2, 0.5), (3, 0.2)]);
        let mse = weighted_pairwise_mse(&[a, b], DECAY, CEILING).expect("ids");
        assert!((mse - 0.026_677_770_837_381_935).abs() < 1e-12, "mse = {mse}");
    }

    #[test]
    fn large_disagreement_clamps_to_one() {
        let a = scored(&[(1, 1.0), (2, 0.0)]);
        let b = scored(&[(2, 1.0), (1, 0.0)]);
        let mse = weighted_pairwise_mse(&[a, b], DECAY, CEILING).expect("ids");
        assert!((mse - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trivial_inputs_return_zero() {
        let a = scored(&[(1, 0.3)]);
        assert!(weighted_pairwise_mse(&[], DECAY, CEILING).expect("none").abs() < f64::EPSILON);
        assert!(weighted_pairwise_mse(&[a], DECAY, CEILING).expect("one").abs() < f64::EPSILON);
        let empty = [Vec::new(), Vec::new()];
        assert!(weighted_pairwise_mse(&empty, DECAY, CEILING).expect("empty").abs() < f64::EPSILON);
    }

    #[test]
    fn mismatched_sets_are_rejected() {
        let a = scored(&[(1, 0.3), (2, 0.2)]);
        let b = scored(&[(1, 0.3), (5, 0.2)]);
        let err = weighted_pairwise_mse(&[a, b], DECAY, CEILING).unwrap_err();
        assert!(matches!(
            err,
            SiftError::RankingSetMismatch {
                list_index: 1,
                missing: 1,
                unexpected: 1,
                ..
            }
        ));
    }
}
