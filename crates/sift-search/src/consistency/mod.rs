//! Agreement metrics over K rankings of the same query intent.
//!
//! Each paraphrase variant of a query produces its own ranking. These
//! metrics quantify whether rewording destabilizes the results:
//!
//! - [`topk`]: order-insensitive overlap of the top-k id sets.
//! - [`kendall`]: rank concordance (weighted Kendall's W), top ranks count more.
//! - [`mse`]: numeric score agreement between every pair of lists.
//!
//! Kendall's W and the pairwise MSE need every list to cover exactly the
//! same ids; a violation is a [`SiftError::RankingSetMismatch`], never a
//! silently misleading score.

pub mod kendall;
pub mod mse;
pub mod topk;

use serde::Serialize;
use sift_core::config::EvaluationConfig;
use sift_core::{Candidate, RankedList, SiftError};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub use kendall::weighted_kendalls_w;
pub use mse::weighted_pairwise_mse;
pub use topk::{consistency_top_k, weighted_consistency_top_k};

/// All three agreement metrics for one set of variant rankings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Weighted Kendall's W in `[0, 1]`; higher is more concordant.
    pub kendalls_w: f64,
    /// Normalized weighted pairwise MSE in `[0, 1]`; lower is better.
    pub pairwise_mse: f64,
    /// Weighted top-k membership overlap in `[0, 1]`; higher is better.
    pub weighted_consistency: f64,
}

impl ConsistencyReport {
    /// Run every metric with the configured decay, ceiling and cutoffs.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::RankingSetMismatch`] if the lists do not cover
    /// identical id sets.
    pub fn evaluate(lists: &[RankedList], config: &EvaluationConfig) -> Result<Self, SiftError> {
        let report = Self {
            kendalls_w: weighted_kendalls_w(lists, config.decay_rate)?,
            pairwise_mse: weighted_pairwise_mse(lists, config.decay_rate, config.mse_ceiling)?,
            weighted_consistency: weighted_consistency_top_k(lists, &config.consistency_cutoffs),
        };
        debug!(
            lists = lists.len(),
            kendalls_w = report.kendalls_w,
            pairwise_mse = report.pairwise_mse,
            weighted_consistency = report.weighted_consistency,
            "evaluated variant consistency"
        );
        Ok(report)
    }
}

/// Check that every list holds the ids of the first list exactly once.
pub(crate) fn ensure_same_id_sets(lists: &[RankedList]) -> Result<(), SiftError> {
    let Some(reference) = lists.first() else {
        return Ok(());
    };
    let expected: BTreeSet<u32> = reference.iter().map(|c| c.id).collect();

    for (list_index, list) in lists.iter().enumerate() {
        let ids: BTreeSet<u32> = list.iter().map(|c| c.id).collect();
        let missing = expected.difference(&ids).count();
        let unexpected = ids.difference(&expected).count();
        if missing > 0 || unexpected > 0 || list.len() != expected.len() {
            return Err(SiftError::RankingSetMismatch {
                list_index,
                expected: expected.len(),
                actual: list.len(),
                missing,
                unexpected,
            });
        }
    }
    Ok(())
}

/// Per-list lookup of `id -> (0-based rank, score)`.
pub(crate) fn positions(list: &[Candidate]) -> HashMap<u32, (usize, f64)> {
    list.iter()
        .enumerate()
        .map(|(rank, c)| (c.id, (rank, c.score)))
        .collect()
}

/// Rank weight `exp(-rank / decay_rate)`.
pub(crate) fn rank_weight(rank: usize, decay_rate: f64) -> f64 {
    (-(rank as f64) / decay_rate).exp()
}
