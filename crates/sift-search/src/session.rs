//! Query session: retrieval collaborators wired to the fusion core.
//!
//! A [`SearchSession`] is built once per process and passed by reference.
//! It borrows the embedding model, the vector index, the keyword engine and
//! the paraphraser through traits, so the fusion core never holds global
//! state and tests can substitute in-memory fakes.
//!
//! The pipeline degrades gracefully:
//! - paraphraser failure falls back to the original query alone
//! - a variant whose embedding or index lookup fails is skipped
//! - keyword engine failure leaves the keyword side empty
//!
//! Fusion then applies its single-side rule to whatever survived.

use crate::consistency::ConsistencyReport;
use crate::fusion::{combine_rankings, reciprocal_rank_fusion};
use crate::records::{CorpusAccessor, attach_records};
use crate::weights::{FusionWeights, fusion_weights};
use anyhow::Result;
use serde::Serialize;
use sift_core::config::ProjectConfig;
use sift_core::{ErrorCode, Folder, RankedList, ScoredRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument, warn};

/// Person name to address aliases, used by the keyword engine to expand
/// "from Alice"-style constraints.
pub type AliasTable = BTreeMap<String, Vec<String>>;

/// Text embedding provider.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Similarity index over one embedding per corpus record.
pub trait VectorIndex {
    /// Up to `limit` candidates of `folder`, most similar first.
    fn search(&self, embedding: &[f32], folder: Folder, limit: usize) -> Result<RankedList>;
}

/// Full-text engine. May return a sparse list: ids without a lexical match
/// are simply absent.
pub trait KeywordEngine {
    fn search(
        &self,
        query: &str,
        folder: Folder,
        limit: usize,
        aliases: &AliasTable,
    ) -> Result<RankedList>;
}

/// Produces reworded variants of a query.
pub trait Paraphraser {
    fn expand(&self, query: &str, variant_count: usize) -> Result<Vec<String>>;
}

/// Final results for one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResults {
    pub query: String,
    pub folder: Folder,
    /// Query wordings actually sent to semantic retrieval.
    pub variants: Vec<String>,
    pub weights: FusionWeights,
    pub results: Vec<ScoredRecord>,
}

/// Retrieval collaborators plus configuration for a run of queries.
pub struct SearchSession<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn VectorIndex,
    keyword: &'a dyn KeywordEngine,
    paraphraser: &'a dyn Paraphraser,
    aliases: &'a AliasTable,
    config: &'a ProjectConfig,
}

impl<'a> SearchSession<'a> {
    #[must_use]
    pub fn new(
        embedder: &'a dyn Embedder,
        index: &'a dyn VectorIndex,
        keyword: &'a dyn KeywordEngine,
        paraphraser: &'a dyn Paraphraser,
        aliases: &'a AliasTable,
        config: &'a ProjectConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            keyword,
            paraphraser,
            aliases,
            config,
        }
    }

    /// Run the full hybrid pipeline and return the top `num_wanted` records.
    ///
    /// # Errors
    ///
    /// Retrieval failures are absorbed. Errors come only from structural
    /// problems: `num_wanted == 0`, or a collaborator returning ids outside
    /// the corpus partition.
    #[instrument(skip(self, corpus))]
    pub fn search<C>(
        &self,
        query: &str,
        folder: Folder,
        corpus: &C,
        num_wanted: usize,
    ) -> Result<QueryResults>
    where
        C: CorpusAccessor + ?Sized,
    {
        let mode = self.config.session.mode;
        let num_items = corpus.len();

        let (variants, semantic) = if mode.uses_semantic() {
            let variants = self.expand_variants(query);
            let rankings: Vec<RankedList> = self
                .variant_rankings(&variants, folder, num_items)
                .into_iter()
                .map(|(_, ranking)| ranking)
                .collect();
            let fused = reciprocal_rank_fusion(&rankings, self.config.fusion.rrf_k);
            (variants, fused)
        } else {
            (vec![query.to_string()], Vec::new())
        };

        let keyword = if mode.uses_keyword() {
            self.keyword_ranking(query, folder, num_items)
        } else {
            Vec::new()
        };

        let tokens = token_count(query);
        let weights = fusion_weights(tokens, &semantic, &keyword, &self.config.fusion);
        let ranked = combine_rankings(
            &semantic,
            &keyword,
            tokens,
            num_items,
            num_wanted,
            false,
            &self.config.fusion,
        )?;
        let results = attach_records(&ranked, corpus)?;

        info!(
            variants = variants.len(),
            semantic = semantic.len(),
            keyword = keyword.len(),
            results = results.len(),
            "query complete"
        );

        Ok(QueryResults {
            query: query.to_string(),
            folder,
            variants,
            weights,
            results,
        })
    }

    /// Measure how stable results are across the query's paraphrases.
    ///
    /// Each surviving variant is fused on its own in full-output mode, so
    /// every per-variant ranking covers all `N` ids, then the three
    /// agreement metrics run over those rankings.
    ///
    /// # Errors
    ///
    /// Propagates fusion errors and [`sift_core::SiftError::RankingSetMismatch`].
    #[instrument(skip(self))]
    pub fn evaluate_variants(
        &self,
        query: &str,
        folder: Folder,
        num_items: usize,
    ) -> Result<ConsistencyReport> {
        let mode = self.config.session.mode;
        let variants = self.expand_variants(query);

        let semantic_by_variant: BTreeMap<String, RankedList> = if mode.uses_semantic() {
            self.variant_rankings(&variants, folder, num_items)
                .into_iter()
                .collect()
        } else {
            BTreeMap::new()
        };

        let mut fused_per_variant = Vec::with_capacity(variants.len());
        for variant in &variants {
            let semantic = semantic_by_variant.get(variant).cloned().unwrap_or_default();
            let keyword = if mode.uses_keyword() {
                self.keyword_ranking(variant, folder, num_items)
            } else {
                Vec::new()
            };
            if semantic.is_empty() && keyword.is_empty() {
                continue;
            }
            fused_per_variant.push(combine_rankings(
                &semantic,
                &keyword,
                token_count(variant),
                num_items,
                0,
                true,
                &self.config.fusion,
            )?);
        }

        let report = ConsistencyReport::evaluate(&fused_per_variant, &self.config.evaluation)?;
        info!(
            variants = fused_per_variant.len(),
            kendalls_w = report.kendalls_w,
            "variant consistency evaluated"
        );
        Ok(report)
    }

    /// Query wordings to retrieve with: the original first when configured,
    /// then the paraphrases, trimmed and without duplicates.
    #[must_use]
    pub fn expand_variants(&self, query: &str) -> Vec<String> {
        let session = &self.config.session;
        let paraphrases = self
            .paraphraser
            .expand(query, session.variant_count)
            .unwrap_or_else(|e| {
                warn!(
                    code = %ErrorCode::RetrievalFailed,
                    "paraphraser unavailable, using the original query only: {e:#}"
                );
                Vec::new()
            });

        let original = query.trim();
        let mut seen = BTreeSet::new();
        let mut variants = Vec::with_capacity(paraphrases.len() + 1);
        let leading = session.include_original.then_some(original);
        for candidate in leading
            .into_iter()
            .chain(paraphrases.iter().map(|p| p.trim()))
        {
            if !candidate.is_empty() && seen.insert(candidate.to_string()) {
                variants.push(candidate.to_string());
            }
        }

        if variants.is_empty() {
            variants.push(original.to_string());
        }
        variants
    }

    /// Embed and search each variant, skipping the ones that fail.
    fn variant_rankings(
        &self,
        variants: &[String],
        folder: Folder,
        num_items: usize,
    ) -> Vec<(String, RankedList)> {
        variants
            .iter()
            .filter_map(|variant| {
                let ranking = self
                    .embedder
                    .embed(variant)
                    .and_then(|embedding| self.index.search(&embedding, folder, num_items));
                match ranking {
                    Ok(ranking) => Some((variant.clone(), ranking)),
                    Err(e) => {
                        warn!(
                            code = %ErrorCode::RetrievalFailed,
                            variant = %variant,
                            "semantic retrieval failed, skipping variant: {e:#}"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    fn keyword_ranking(&self, query: &str, folder: Folder, num_items: usize) -> RankedList {
        self.keyword
            .search(query, folder, num_items, self.aliases)
            .unwrap_or_else(|e| {
                warn!(
                    code = %ErrorCode::RetrievalFailed,
                    "keyword layer unavailable, falling back to semantic-only fusion: {e:#}"
                );
                Vec::new()
            })
    }
}

/// Whitespace-separated tokens in a query.
#[must_use]
pub fn token_count(query: &str) -> usize {
    query.split_whitespace().count()
}
