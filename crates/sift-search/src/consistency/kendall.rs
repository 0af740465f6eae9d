//! Weighted Kendall's W.
//!
//! ```text
//! var(id)   = population variance of id's K ranks (0-based)
//! w(id)     = exp(-min_rank(id) / decay_rate)
//! observed  = Σ w(id)·var(id) / Σ w(id)
//! max       = same weighting applied to the reversed ranks N-1..0
//! W         = clamp(1 - observed / max, 0, 1)
//! ```
//!
//! Ids that at least one variant ranked highly dominate the score; ids every
//! variant buried barely move it.

use crate::consistency::{ensure_same_id_sets, positions, rank_weight};
use sift_core::{RankedList, SiftError};

/// Rank concordance of K rankings over the same ids, in `[0, 1]`.
///
/// Returns `1.0` for fewer than two lists or empty lists: there is nothing
/// to disagree about.
///
/// # Errors
///
/// Returns [`SiftError::RankingSetMismatch`] if the lists do not cover
/// identical id sets.
pub fn weighted_kendalls_w(lists: &[RankedList], decay_rate: f64) -> Result<f64, SiftError> {
    if lists.len() < 2 {
        return Ok(1.0);
    }
    ensure_same_id_sets(lists)?;

    let num_items = lists[0].len();
    if num_items == 0 {
        return Ok(1.0);
    }

    let lookups: Vec<_> = lists.iter().map(|l| positions(l)).collect();
    let k = lists.len() as f64;

    let mut weighted_variance = 0.0;
    let mut total_weight = 0.0;
    let mut ranks = Vec::with_capacity(lists.len());
    for candidate in &lists[0] {
        ranks.clear();
        ranks.extend(
            lookups
                .iter()
                .filter_map(|lookup| lookup.get(&candidate.id).map(|&(rank, _)| rank)),
        );

        let mean = ranks.iter().sum::<usize>() as f64 / k;
        let variance = ranks
            .iter()
            .map(|&r| (r as f64 - mean).powi(2))
            .sum::<f64>()
            / k;
        let min_rank = ranks.iter().copied().min().unwrap_or(0);
        let weight = rank_weight(min_rank, decay_rate);

        weighted_variance += weight * variance;
        total_weight += weight;
    }
    let observed = weighted_variance / total_weight;

    // Every list gets the same adversarial vector, so the average over K
    // lists equals one evaluation.
    let max = reversed_rank_variance(num_items, decay_rate);
    if max <= 0.0 {
        return Ok(1.0);
    }

    Ok((1.0 - observed / max).clamp(0.0, 1.0))
}

/// Weighted variance of the rank vector `N-1, N-2, ..., 0` with weights
/// `exp(-rank / decay_rate)`.
fn reversed_rank_variance(num_items: usize, decay_rate: f64) -> f64 {
    let ranks = (0..num_items).rev();
    let total_weight: f64 = ranks.clone().map(|r| rank_weight(r, decay_rate)).sum();
    let mean = ranks
        .clone()
        .map(|r| rank_weight(r, decay_rate) * r as f64)
        .sum::<f64>()
        / total_weight;
    ranks
        .map(|r| rank_weight(r, decay_rate) * (r as f64 - mean).powi(2))
        .sum::<f64>()
        / total_weight
}
