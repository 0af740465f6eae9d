//! Densification and min-max normalization of candidate scores.
//!
//! Retrieval sources hand back sparse lists; fusion arithmetic wants one
//! score per corpus id. [`fill_missing`] builds that dense vector (absent ids
//! score 0.0) and [`min_max`] rescales it to `[0, 1]`.

use sift_core::{Candidate, SiftError};

/// Expand a sparse candidate list into a dense score vector of length
/// `num_items`, where index `id - 1` holds the score for `id`.
///
/// Absent ids score `0.0`. If an id repeats, the last occurrence wins.
///
/// # Errors
///
/// Returns [`SiftError::CandidateOutOfRange`] for an id of 0 or one larger
/// than `num_items`.
pub fn fill_missing(candidates: &[Candidate], num_items: usize) -> Result<Vec<f64>, SiftError> {
    let mut dense = vec![0.0; num_items];
    for candidate in candidates {
        let slot = (candidate.id as usize)
            .checked_sub(1)
            .and_then(|idx| dense.get_mut(idx))
            .ok_or(SiftError::CandidateOutOfRange {
                id: candidate.id,
                num_items,
            })?;
        *slot = candidate.score;
    }
    Ok(dense)
}

/// Min-max normalization that maps scores to `[0, 1]`.
///
/// The maximum maps to 1 and the minimum to 0. If all values are equal
/// (including the all-zero vector and a single element), all outputs are
/// `0.0`: the source has no discriminative power for this query.
#[must_use]
pub fn min_max(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    // max >= min, so a non-positive range means every value is equal.
    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; scores.len()];
    }

    scores.iter().map(|&s| (s - min) / range).collect()
}
