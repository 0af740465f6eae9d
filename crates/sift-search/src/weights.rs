//! Adaptive weighting between the semantic and keyword signals.
//!
//! # Stand-out detection
//!
//! A retrieval side "stands out" when its best results sit far above the
//! bulk of its own score distribution:
//!
//! ```text
//! mean over top-N of (score - mean(all)) / stdev(all)  >=  threshold (2.0)
//! ```
//!
//! Starting from 0.5, the semantic weight moves one step (0.25) toward
//! whichever side stands out alone, then is clamped to `[0.2, 0.8]` so that
//! neither side is ever fully trusted or fully discarded. Small candidate
//! sets (200 or fewer on either side) are too noisy for the heuristic and
//! keep the even split.
//!
//! # Query-length curve
//!
//! [`WeightStrategy::QueryLength`] selects an older design: a logistic curve
//! over the query's token count, 0.25 for one-word queries and saturating
//! near 0.72 for long ones.
//!
//! In both strategies a side with no candidates at all gets weight 0 and the
//! other side gets 1.

use serde::Serialize;
use sift_core::Candidate;
use sift_core::config::{FusionConfig, WeightStrategy};
use tracing::debug;

const BASE_SEMANTIC_WEIGHT: f64 = 0.5;

const QUERY_LENGTH_FLOOR: f64 = 0.25;
const QUERY_LENGTH_SPAN: f64 = 0.5;
const QUERY_LENGTH_CAP: f64 = 0.75;
const QUERY_LENGTH_STEEPNESS: f64 = 0.9;
const QUERY_LENGTH_MIDPOINT: f64 = 4.0;

/// Semantic and keyword weights; always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusionWeights {
    pub semantic: f64,
    pub keyword: f64,
}

impl FusionWeights {
    #[must_use]
    pub fn from_semantic(semantic: f64) -> Self {
        Self {
            semantic,
            keyword: 1.0 - semantic,
        }
    }
}

/// Decide how far to trust each side for one query.
///
/// See [`select_semantic_weight`] for the rules.
#[must_use]
pub fn fusion_weights(
    query_token_count: usize,
    semantic: &[Candidate],
    keyword: &[Candidate],
    config: &FusionConfig,
) -> FusionWeights {
    FusionWeights::from_semantic(select_semantic_weight(
        query_token_count,
        semantic,
        keyword,
        config,
    ))
}

/// Pick the semantic weight in `[0, 1]`; the keyword weight is `1 - w`.
///
/// - Only semantic candidates: `1.0`. Only keyword candidates: `0.0`.
/// - Neither: the neutral `0.5` (fusion returns nothing in that case).
/// - Both: the configured [`WeightStrategy`].
#[must_use]
pub fn select_semantic_weight(
    query_token_count: usize,
    semantic: &[Candidate],
    keyword: &[Candidate],
    config: &FusionConfig,
) -> f64 {
    match (semantic.is_empty(), keyword.is_empty()) {
        (true, true) => BASE_SEMANTIC_WEIGHT,
        (false, true) => 1.0,
        (true, false) => 0.0,
        (false, false) => {
            let weight = match config.weight_strategy {
                WeightStrategy::StandOut => standout_weight(semantic, keyword, config),
                WeightStrategy::QueryLength => query_length_weight(query_token_count),
            };
            weight.clamp(config.min_semantic_weight, config.max_semantic_weight)
        }
    }
}

/// Stand-out comparison between two non-empty sides (before clamping).
#[must_use]
pub fn standout_weight(semantic: &[Candidate], keyword: &[Candidate], config: &FusionConfig) -> f64 {
    let min = config.standout_min_candidates;
    if semantic.len() <= min || keyword.len() <= min {
        debug!(
            semantic = semantic.len(),
            keyword = keyword.len(),
            min,
            "candidate sets too small for stand-out detection; keeping even split"
        );
        return BASE_SEMANTIC_WEIGHT;
    }

    let (top_n, threshold) = (config.standout_top_n, config.standout_z_threshold);
    let semantic_stands_out = stands_out(semantic, top_n, threshold);
    let keyword_stands_out = stands_out(keyword, top_n, threshold);

    let weight = match (semantic_stands_out, keyword_stands_out) {
        (true, false) => BASE_SEMANTIC_WEIGHT + config.weight_step,
        (false, true) => BASE_SEMANTIC_WEIGHT - config.weight_step,
        _ => BASE_SEMANTIC_WEIGHT,
    };

    debug!(
        threshold,
        semantic_stands_out,
        keyword_stands_out,
        weight,
        "stand-out weighting"
    );
    weight
}

/// Whether a side's top results sit at least `threshold` standard
/// deviations above its own mean.
#[must_use]
pub fn stands_out(candidates: &[Candidate], top_n: usize, threshold: f64) -> bool {
    mean_top_z_score(candidates, top_n).is_some_and(|z| z >= threshold)
}

/// Average z-score of the `top_n` highest scores, measured against the
/// mean and sample standard deviation of the whole list.
///
/// Returns `None` when the deviation is undefined (fewer than two entries)
/// or zero, which callers treat as "does not stand out".
#[must_use]
pub fn mean_top_z_score(candidates: &[Candidate], top_n: usize) -> Option<f64> {
    if candidates.len() < 2 || top_n == 0 {
        return None;
    }

    let n = candidates.len() as f64;
    let mean = candidates.iter().map(|c| c.score).sum::<f64>() / n;
    let variance = candidates
        .iter()
        .map(|c| (c.score - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let stdev = variance.sqrt();
    if stdev <= 0.0 || !stdev.is_finite() {
        return None;
    }

    let mut scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    let top = &scores[..top_n.min(scores.len())];

    let z_sum: f64 = top.iter().map(|s| (s - mean) / stdev).sum();
    Some(z_sum / top.len() as f64)
}

/// Logistic semantic weight over the number of query tokens.
///
/// Exactly 0.25 at one token, rising steeply around four tokens and capped
/// at 0.75. Short queries lean on keyword matching; longer natural-language
/// queries lean on embeddings.
#[must_use]
pub fn query_length_weight(query_token_count: usize) -> f64 {
    let tokens = query_token_count as f64;
    let growth = logistic(QUERY_LENGTH_STEEPNESS * (tokens - QUERY_LENGTH_MIDPOINT));
    let at_one_token = logistic(QUERY_LENGTH_STEEPNESS * (1.0 - QUERY_LENGTH_MIDPOINT));
    (QUERY_LENGTH_SPAN.mul_add(growth - at_one_token, QUERY_LENGTH_FLOOR)).min(QUERY_LENGTH_CAP)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        let tolerance = 1e-9;
        assert!(
            (actual - expected).abs() <= tolerance,
            "actual ({actual}) != expected ({expected})"
        );
    }

    /// Ten clear winners over a flat floor: mean top-10 z ≈ 5.4.
    fn spiky(n: u32) -> Vec<Candidate> {
        (1..=n)
            .map(|id| Candidate::new(id, if id <= 10 { 1.0 } else { 0.0 }))
            .collect()
    }

    /// Evenly spread scores: mean top-10 z ≈ 1.7.
    fn uniform(n: u32) -> Vec<Candidate> {
        (1..=n)
            .map(|id| Candidate::new(id, f64::from(id - 1) / f64::from(n)))
            .collect()
    }

    #[test]
    fn one_sided_inputs_force_full_weight() {
        let config = FusionConfig::default();
        let some = [Candidate::new(1, 0.4)];
        assert_approx_eq(select_semantic_weight(3, &some, &[], &config), 1.0);
        assert_approx_eq(select_semantic_weight(3, &[], &some, &config), 0.0);
    }

    #[test]
    fn empty_inputs_are_neutral() {
        let config = FusionConfig::default();
        assert_approx_eq(select_semantic_weight(3, &[], &[], &config), 0.5);
    }

    #[test]
    fn small_candidate_sets_keep_even_split() {
        let config = FusionConfig::default();
        let weight = select_semantic_weight(5, &spiky(200), &uniform(300), &config);
        assert_approx_eq(weight, 0.5);
    }

    #[test]
    fn semantic_standing_out_alone_gains_weight() {
        let config = FusionConfig::default();
        let weights = fusion_weights(5, &spiky(300), &uniform(300), &config);
        assert_approx_eq(weights.semantic, 0.75);
        assert_approx_eq(weights.keyword, 0.25);
    }

    #[test]
    fn keyword_standing_out_alone_takes_weight() {
        let config = FusionConfig::default();
        let weight = select_semantic_weight(5, &uniform(300), &spiky(300), &config);
        assert_approx_eq(weight, 0.25);
    }

    #[test]
    fn both_or_neither_standing_out_is_neutral() {
        let config = FusionConfig::default();
        assert_approx_eq(
            select_semantic_weight(5, &spiky(300), &spiky(250), &config),
            0.5,
        );
        assert_approx_eq(
            select_semantic_weight(5, &uniform(300), &uniform(250), &config),
            0.5,
        );
    }

    #[test]
    fn weight_is_clamped_to_configured_band() {
        let config = FusionConfig {
            weight_step: 0.45,
            ..FusionConfig::default()
        };
        assert_approx_eq(
            select_semantic_weight(5, &spiky(300), &uniform(300), &config),
            0.8,
        );
        assert_approx_eq(
            select_semantic_weight(5, &uniform(300), &spiky(300), &config),
            0.2,
        );
    }

    #[test]
    fn mean_top_z_score_matches_hand_computation() {
        let z = mean_top_z_score(&spiky(300), 10).expect("defined");
        assert!((z - 5.376).abs() < 1e-3, "z = {z}");
        let z = mean_top_z_score(&uniform(300), 10).expect("defined");
        assert!((z - 1.6715).abs() < 1e-3, "z = {z}");
    }

    #[test]
    fn undefined_deviation_does_not_stand_out() {
        assert!(mean_top_z_score(&[Candidate::new(1, 9.0)], 10).is_none());
        let flat: Vec<_> = (1..=5).map(|id| Candidate::new(id, 0.3)).collect();
        assert!(mean_top_z_score(&flat, 10).is_none());
        assert!(!stands_out(&flat, 10, 2.0));
    }

    #[test]
    fn stands_out_compares_mean_top_z_to_threshold() {
        assert!(stands_out(&spiky(300), 10, 2.0));
        assert!(!stands_out(&uniform(300), 10, 2.0));
        assert!(stands_out(&uniform(300), 10, 1.5));
    }

    #[test]
    fn top_n_larger_than_list_uses_everything() {
        let list = [Candidate::new(1, 1.0), Candidate::new(2, 0.0)];
        // The two z-scores are symmetric around the mean.
        assert_approx_eq(mean_top_z_score(&list, 10).expect("defined"), 0.0);
    }

    #[test]
    fn query_length_curve_shape() {
        assert_approx_eq(query_length_weight(1), 0.25);
        assert!(query_length_weight(4) > query_length_weight(2));
        assert!(query_length_weight(12) <= 0.75);
        assert!(query_length_weight(40) > 0.7);
    }

    #[test]
    fn query_length_strategy_ignores_distributions() {
        let config = FusionConfig {
            weight_strategy: WeightStrategy::QueryLength,
            ..FusionConfig::default()
        };
        let sem = [Candidate::new(1, 0.9)];
        let kw = [Candidate::new(2, 0.3)];
        assert_approx_eq(select_semantic_weight(1, &sem, &kw, &config), 0.25);
        assert_approx_eq(
            select_semantic_weight(8, &sem, &kw, &config),
            query_length_weight(8),
        );
    }
}
