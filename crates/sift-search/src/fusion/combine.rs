//! Weighted combination of a semantic and a keyword ranking.
//!
//! # Algorithm
//!
//! ```text
//! sem_norm = min_max(fill_missing(semantic, N))
//! kw_norm  = min_max(fill_missing(keyword, N))
//! w        = select_semantic_weight(...)
//! score(i) = w * sem_norm[i] + (1 - w) * kw_norm[i]      for i in 0..N
//! ```
//!
//! A side with no candidates contributes nothing and the other side gets
//! weight 1. Production callers ask for the top `num_wanted` (bounded heap,
//! `O(N log num_wanted)`); evaluation callers pass `full_output` to get all
//! N candidates in order.

use crate::fusion::rank_order;
use crate::normalize::{fill_missing, min_max};
use crate::weights::fusion_weights;
use sift_core::config::FusionConfig;
use sift_core::{Candidate, RankedList, SiftError};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::debug;

/// Combine semantic and keyword candidates into one ranking.
///
/// # Parameters
///
/// - `semantic`: Semantic candidates (typically the RRF-fused variant list).
/// - `keyword`: Keyword candidates; may be sparse.
/// - `query_token_count`: Whitespace tokens in the user's query.
/// - `num_items`: Size `N` of the corpus partition; ids lie in `1..=N`.
/// - `num_wanted`: How many results to return when `full_output` is false.
/// - `full_output`: Return every id in rank order (evaluation mode).
/// - `config`: Stand-out and clamping parameters.
///
/// # Returns
///
/// Candidates sorted by combined score descending, ties by ascending id.
/// Empty when both inputs are empty.
///
/// # Errors
///
/// - [`SiftError::InvalidSelection`] when `num_wanted == 0` without `full_output`.
/// - [`SiftError::CandidateOutOfRange`] when an id falls outside `1..=num_items`.
pub fn combine_rankings(
    semantic: &[Candidate],
    keyword: &[Candidate],
    query_token_count: usize,
    num_items: usize,
    num_wanted: usize,
    full_output: bool,
    config: &FusionConfig,
) -> Result<RankedList, SiftError> {
    let has_semantic = !semantic.is_empty();
    let has_keyword = !keyword.is_empty();
    if !has_semantic && !has_keyword {
        return Ok(Vec::new());
    }
    if num_wanted == 0 && !full_output {
        return Err(SiftError::InvalidSelection);
    }

    let semantic_norm = normalized_side(semantic, num_items)?;
    let keyword_norm = normalized_side(keyword, num_items)?;
    let weights = fusion_weights(query_token_count, semantic, keyword, config);

    let combined = (1_u32..).take(num_items).enumerate().map(|(idx, id)| {
        let sem = semantic_norm.as_ref().map_or(0.0, |v| v[idx]);
        let kw = keyword_norm.as_ref().map_or(0.0, |v| v[idx]);
        Candidate::new(id, weights.semantic.mul_add(sem, weights.keyword * kw))
    });

    let ranked = if full_output {
        let mut all: Vec<Candidate> = combined.collect();
        all.sort_by(rank_order);
        all
    } else {
        top_n(combined, num_wanted)
    };

    debug!(
        num_items,
        num_wanted,
        full_output,
        semantic_weight = weights.semantic,
        keyword_weight = weights.keyword,
        returned = ranked.len(),
        "combined semantic and keyword rankings"
    );

    Ok(ranked)
}

/// Densify and normalize one side, or `None` if the side is absent.
fn normalized_side(
    candidates: &[Candidate],
    num_items: usize,
) -> Result<Option<Vec<f64>>, SiftError> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let dense = fill_missing(candidates, num_items)?;
    Ok(Some(min_max(&dense)))
}

/// Heap entry where "greater" means "ranks higher".
#[derive(Debug, Clone, Copy)]
struct Ranked(Candidate);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&other.0, &self.0)
    }
}

/// Bounded selection of the best `n` candidates, returned in rank order.
fn top_n(candidates: impl Iterator<Item = Candidate>, n: usize) -> Vec<Candidate> {
    // Min-heap on rank: the root is the weakest candidate kept so far.
    let mut heap: BinaryHeap<Reverse<Ranked>> =
        BinaryHeap::with_capacity(n.saturating_add(1).min(1024));
    for candidate in candidates {
        heap.push(Reverse(Ranked(candidate)));
        if heap.len() > n {
            heap.pop();
        }
    }

    let mut out: Vec<Candidate> = heap.into_iter().map(|Reverse(Ranked(c))| c).collect();
    out.sort_by(rank_order);
    out
}
