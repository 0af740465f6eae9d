#![forbid(unsafe_code)]
//! sift-search library.
//!
//! Merges a semantic (embedding-similarity) ranking and a keyword
//! (full-text) ranking into one ordered result list, fuses paraphrased query
//! variants with Reciprocal Rank Fusion, and measures how stable fused
//! rankings are across paraphrases.
//!
//! Retrieval itself is out of scope: embeddings, the vector index, the
//! keyword engine, and the paraphraser are reached through the traits in
//! [`session`].
//!
//! # Conventions
//!
//! - **Errors**: `sift_core::SiftError` for structural mismatches in the
//!   ranking math; `anyhow::Result` where collaborators are involved.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod consistency;
pub mod fusion;
pub mod normalize;
pub mod records;
pub mod session;
pub mod weights;

pub use consistency::{
    ConsistencyReport, consistency_top_k, weighted_consistency_top_k, weighted_kendalls_w,
    weighted_pairwise_mse,
};
pub use fusion::{combine_rankings, reciprocal_rank_fusion};
pub use records::{Corpus, CorpusAccessor, attach_records};
pub use session::{QueryResults, SearchSession};
pub use weights::{FusionWeights, fusion_weights};
