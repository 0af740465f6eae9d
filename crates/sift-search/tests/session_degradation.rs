//! Graceful degradation of the query session.
//!
//! # Scenarios covered
//!
//! 1. **Healthy hybrid run**: variants are fused and both sides contribute.
//! 2. **Embedder down**: every variant fails, fusion runs keyword-only.
//! 3. **Keyword engine down**: fusion runs semantic-only.
//! 4. **Both sides down**: empty results, no error.
//! 5. **One flaky variant**: the failing paraphrase is skipped.
//! 6. **Search modes**: keyword-only and semantic-only sessions skip the
//!    other side entirely.
//! 7. **Variant evaluation**: agreeing paraphrases score as fully
//!    consistent; a keyword engine outage still yields a report.

use anyhow::{Result, bail};
use sift_core::config::{ProjectConfig, SearchMode};
use sift_core::{Candidate, CorpusRecord, Folder, RankedList};
use sift_search::Corpus;
use sift_search::session::{
    AliasTable, Embedder, KeywordEngine, Paraphraser, SearchSession, VectorIndex,
};
use std::cell::RefCell;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Embeds a text as its length; fails on texts containing `fail_on`.
struct LengthEmbedder {
    fail_on: Option<&'static str>,
}

impl Embedder for LengthEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_on.is_some_and(|needle| text.contains(needle)) {
            bail!("embedding model unavailable");
        }
        Ok(vec![text.len() as f32])
    }
}

/// Always ranks ids `1..=N` with descending scores.
struct FixedIndex;

impl VectorIndex for FixedIndex {
    fn search(&self, _embedding: &[f32], _folder: Folder, limit: usize) -> Result<RankedList> {
        Ok((1..=limit as u32)
            .map(|id| Candidate::new(id, 1.0 / f64::from(id)))
            .collect())
    }
}

/// Matches id 3 only, and records the aliases it was handed.
struct FixedKeyword {
    down: bool,
    seen_aliases: RefCell<usize>,
}

impl FixedKeyword {
    fn up() -> Self {
        Self {
            down: false,
            seen_aliases: RefCell::new(0),
        }
    }

    fn down() -> Self {
        Self {
            down: true,
            seen_aliases: RefCell::new(0),
        }
    }
}

impl KeywordEngine for FixedKeyword {
    fn search(
        &self,
        _query: &str,
        _folder: Folder,
        _limit: usize,
        aliases: &AliasTable,
    ) -> Result<RankedList> {
        *self.seen_aliases.borrow_mut() = aliases.len();
        if self.down {
            bail!("connection refused");
        }
        Ok(vec![Candidate::new(3, 7.5)])
    }
}

struct FixedParaphraser(Vec<&'static str>);

impl Paraphraser for FixedParaphraser {
    fn expand(&self, _query: &str, variant_count: usize) -> Result<Vec<String>> {
        Ok(self
            .0
            .iter()
            .take(variant_count)
            .map(|s| (*s).to_string())
            .collect())
    }
}

fn corpus() -> Corpus {
    let records = (1..=5)
        .map(|id| CorpusRecord::bare(id, Folder::Inbox))
        .collect();
    Corpus::from_records(Folder::Inbox, records).expect("dense corpus")
}

fn aliases() -> AliasTable {
    let mut table = AliasTable::new();
    table.insert(
        "alice".to_string(),
        vec!["alice@example.com".to_string(), "a.smith@example.com".to_string()],
    );
    table
}

fn ids(results: &sift_search::QueryResults) -> Vec<u32> {
    results.results.iter().map(|r| r.record.id).collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn healthy_hybrid_run_uses_both_sides() {
    let config = ProjectConfig::default();
    let aliases = aliases();
    let keyword = FixedKeyword::up();
    let paraphraser = FixedParaphraser(vec!["emails from alice", "alice messages"]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: None },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("mail from alice", Folder::Inbox, &corpus(), 3)
        .expect("search");

    assert_eq!(results.variants.len(), 3);
    assert!((results.weights.semantic - 0.5).abs() < f64::EPSILON);
    // Id 1 tops semantic (0.5), id 3 gets keyword's full half plus a semantic share.
    assert_eq!(ids(&results), vec![3, 1, 2]);
    assert_eq!(results.results[0].rank, 1);
    assert_eq!(*keyword.seen_aliases.borrow(), 1);
}

#[test]
fn embedder_outage_falls_back_to_keyword_only() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::up();
    let paraphraser = FixedParaphraser(vec!["invoice"]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: Some("") },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("invoices", Folder::Inbox, &corpus(), 2)
        .expect("search degrades");
    assert!(results.weights.semantic.abs() < f64::EPSILON);
    assert_eq!(ids(&results), vec![3, 1]);
}

#[test]
fn keyword_outage_falls_back_to_semantic_only() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::down();
    let paraphraser = FixedParaphraser(vec![]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: None },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("quarterly report", Folder::Inbox, &corpus(), 5)
        .expect("search degrades");
    assert!((results.weights.semantic - 1.0).abs() < f64::EPSILON);
    assert_eq!(ids(&results), vec![1, 2, 3, 4, 5]);
}

#[test]
fn total_outage_returns_no_results() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::down();
    let paraphraser = FixedParaphraser(vec![]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: Some("") },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("anything", Folder::Inbox, &corpus(), 5)
        .expect("no error");
    assert!(results.results.is_empty());
}

#[test]
fn flaky_variant_is_skipped() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::down();
    let paraphraser = FixedParaphraser(vec!["broken wording", "fine wording"]);
    let session = SearchSession::new(
        &LengthEmbedder {
            fail_on: Some("broken"),
        },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("original wording", Folder::Inbox, &corpus(), 1)
        .expect("search");
    assert_eq!(results.variants.len(), 3);
    assert_eq!(ids(&results), vec![1]);
}

#[test]
fn keyword_mode_never_embeds() {
    let mut config = ProjectConfig::default();
    config.session.mode = SearchMode::Keyword;
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::up();
    let paraphraser = FixedParaphraser(vec!["ignored"]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: Some("") },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("from bob", Folder::Inbox, &corpus(), 3)
        .expect("search");
    assert_eq!(results.variants, vec!["from bob".to_string()]);
    assert_eq!(ids(&results)[0], 3);
}

#[test]
fn semantic_mode_never_queries_keyword_engine() {
    let mut config = ProjectConfig::default();
    config.session.mode = SearchMode::Semantic;
    let aliases = aliases();
    let keyword = FixedKeyword::up();
    let paraphraser = FixedParaphraser(vec![]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: None },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let results = session
        .search("trip plans", Folder::Inbox, &corpus(), 2)
        .expect("search");
    assert_eq!(ids(&results), vec![1, 2]);
    assert_eq!(*keyword.seen_aliases.borrow(), 0);
}

#[test]
fn agreeing_variants_are_fully_consistent() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::up();
    let paraphraser = FixedParaphraser(vec!["a", "b", "c"]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: None },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let report = session
        .evaluate_variants("q", Folder::Inbox, 5)
        .expect("evaluate");
    assert!((report.kendalls_w - 1.0).abs() < 1e-12);
    assert!(report.pairwise_mse.abs() < 1e-12);
    assert!((report.weighted_consistency - 1.0).abs() < 1e-12);
}

#[test]
fn evaluation_survives_keyword_outage() {
    let config = ProjectConfig::default();
    let aliases = AliasTable::new();
    let keyword = FixedKeyword::down();
    let paraphraser = FixedParaphraser(vec!["x", "y"]);
    let session = SearchSession::new(
        &LengthEmbedder { fail_on: None },
        &FixedIndex,
        &keyword,
        &paraphraser,
        &aliases,
        &config,
    );

    let report = session
        .evaluate_variants("w", Folder::Inbox, 4)
        .expect("evaluate");
    assert!((report.kendalls_w - 1.0).abs() < 1e-12);
}
