//! Reciprocal Rank Fusion over paraphrase-variant rankings.
//!
//! Each variant of a query yields its own ranking. RRF ignores raw scores
//! and rewards items that rank near the top in many lists:
//!
//! ```text
//! RRF_score(id) = Σ_lists 1 / (k + rank + 1)      rank is 0-based
//! ```
//!
//! `k` (default 60) damps the influence of any single list's top ranks.
//! An id absent from a list contributes nothing for that list.

use crate::fusion::rank_order;
use sift_core::{Candidate, RankedList};
use std::collections::BTreeMap;
use tracing::debug;

/// Default RRF damping constant.
pub const DEFAULT_RRF_K: usize = 60;

/// Fuse variant rankings with Reciprocal Rank Fusion.
///
/// The input scores are ignored; only each list's order matters. The result
/// covers the union of ids across all lists, sorted by RRF score descending
/// with ties broken by ascending id. No input yields an empty ranking.
#[must_use]
pub fn reciprocal_rank_fusion(lists: &[RankedList], k_const: usize) -> RankedList {
    let k = k_const as f64;
    let mut scores: BTreeMap<u32, f64> = BTreeMap::new();

    for list in lists {
        for (rank, candidate) in list.iter().enumerate() {
            *scores.entry(candidate.id).or_insert(0.0) += 1.0 / (k + rank as f64 + 1.0);
        }
    }

    let mut fused: RankedList = scores
        .into_iter()
        .map(|(id, score)| Candidate::new(id, score))
        .collect();
    fused.sort_by(rank_order);

    debug!(
        lists = lists.len(),
        k = k_const,
        fused = fused.len(),
        "fused variant rankings"
    );
    fused
}
