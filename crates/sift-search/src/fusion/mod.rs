//! Fusion of ranked candidate lists.
//!
//! - [`combine`] merges one semantic and one keyword ranking through
//!   min-max normalized, adaptively weighted scores.
//! - [`rrf`] merges K paraphrase-variant rankings with Reciprocal Rank
//!   Fusion; its output is the semantic input to [`combine`].
//!
//! Both order results by score descending with ties broken by ascending id,
//! so identical inputs always produce identical output.

pub mod combine;
pub mod rrf;

use sift_core::Candidate;
use std::cmp::Ordering;

pub use combine::combine_rankings;
pub use rrf::reciprocal_rank_fusion;

/// Final-ranking order: higher score first, then lower id.
pub(crate) fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}
