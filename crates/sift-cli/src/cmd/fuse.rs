//! `sift fuse`: combine semantic and keyword candidates into a final ranking.
//!
//! The request file carries the retrieval output for one query. When
//! `variants` (one ranking per paraphrase) is present it is RRF-fused into
//! the semantic side; otherwise `semantic` is used as-is.

use crate::cmd::read_json;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};
use crate::report;
use clap::Args;
use serde::{Deserialize, Serialize};
use sift_core::config::FusionConfig;
use sift_core::{CorpusRecord, Folder, RankedList};
use sift_search::session::token_count;
use sift_search::{
    Corpus, CorpusAccessor, FusionWeights, attach_records, combine_rankings, fusion_weights,
    reciprocal_rank_fusion,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
#[command(
    about = "Fuse semantic and keyword rankings for one query",
    long_about = "Combine a semantic ranking (or K paraphrase-variant rankings, fused with RRF) \
                  and a keyword ranking into one ordered result list.\n\n\
                  Scores are densified over ids 1..N, min-max normalized and mixed with \
                  adaptive weights. Ties break by ascending id.",
    after_help = "EXAMPLES:\n    # Top 10 ids for a request\n    sift fuse --request query.json\n\n\
                  # Attach email records and append a report\n    sift fuse --request query.json --corpus emails.json --report top_emails.txt\n\n\
                  # Every id in rank order, for evaluation\n    sift fuse --request query.json --full --json"
)]
pub struct FuseArgs {
    /// JSON request: `{query, folder, num_items?, semantic?, keyword?, variants?}`.
    #[arg(short, long)]
    pub request: PathBuf,

    /// JSON array of email records; enables record attachment.
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Append a plain-text result block to this file.
    #[arg(long, requires = "corpus")]
    pub report: Option<PathBuf>,

    /// Maximum number of results to return.
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Return every id in rank order instead of the top `-n`.
    #[arg(long)]
    pub full: bool,
}

/// Retrieval output for one query.
#[derive(Debug, Deserialize)]
pub struct FuseRequest {
    pub query: String,
    #[serde(default)]
    pub folder: Folder,
    /// Partition size; defaults to the corpus size, else the largest id seen.
    #[serde(default)]
    pub num_items: Option<usize>,
    #[serde(default)]
    pub semantic: RankedList,
    #[serde(default)]
    pub keyword: RankedList,
    #[serde(default)]
    pub variants: Vec<RankedList>,
}

/// A single fused result row.
#[derive(Debug, Serialize)]
pub struct FuseRow {
    pub rank: usize,
    pub id: u32,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<CorpusRecord>,
}

/// JSON envelope for fuse output.
#[derive(Debug, Serialize)]
pub struct FuseOutput {
    pub query: String,
    pub folder: Folder,
    pub num_items: usize,
    pub weights: FusionWeights,
    pub count: usize,
    pub results: Vec<FuseRow>,
}

/// Execute `sift fuse`.
///
/// # Errors
///
/// Returns an error if an input cannot be read, a candidate id falls outside
/// the partition, `-n 0` is given without `--full`, or the report cannot be
/// written.
pub fn run_fuse(args: &FuseArgs, output: OutputMode, config: &FusionConfig) -> anyhow::Result<()> {
    let fuse_output = match fuse(args, config) {
        Ok(fuse_output) => fuse_output,
        Err(e) => {
            render_error(output, &CliError::from_anyhow(&e))?;
            return Err(e);
        }
    };

    render_mode(
        output,
        &fuse_output,
        |out, w| render_fuse_text(out, w),
        |out, w| render_fuse_human(out, w),
    )
}

fn fuse(args: &FuseArgs, config: &FusionConfig) -> anyhow::Result<FuseOutput> {
    let request: FuseRequest = read_json(&args.request)?;
    let corpus = args
        .corpus
        .as_deref()
        .map(|path| Corpus::load_json(path, request.folder))
        .transpose()?;

    let semantic = if request.variants.is_empty() {
        request.semantic
    } else {
        if !request.semantic.is_empty() {
            debug!("request has both variants and semantic; using fused variants");
        }
        reciprocal_rank_fusion(&request.variants, config.rrf_k)
    };
    let keyword = request.keyword;

    let num_items = request
        .num_items
        .or_else(|| corpus.as_ref().map(CorpusAccessor::len))
        .unwrap_or_else(|| {
            semantic
                .iter()
                .chain(&keyword)
                .map(|c| c.id as usize)
                .max()
                .unwrap_or(0)
        });

    let tokens = token_count(&request.query);
    let weights = fusion_weights(tokens, &semantic, &keyword, config);
    let ranked = combine_rankings(
        &semantic, &keyword, tokens, num_items, args.limit, args.full, config,
    )?;

    let results = match corpus {
        Some(ref corpus) => {
            let attached = attach_records(&ranked, corpus)?;
            if let Some(ref path) = args.report {
                report::append_report(path, &request.query, request.folder, &attached)?;
            }
            attached
                .into_iter()
                .map(|scored| FuseRow {
                    rank: scored.rank,
                    id: scored.record.id,
                    score: scored.score,
                    record: Some(scored.record),
                })
                .collect()
        }
        None => ranked
            .iter()
            .enumerate()
            .map(|(idx, c)| FuseRow {
                rank: idx + 1,
                id: c.id,
                score: c.score,
                record: None,
            })
            .collect::<Vec<_>>(),
    };

    Ok(FuseOutput {
        query: request.query,
        folder: request.folder,
        num_items,
        weights,
        count: results.len(),
        results,
    })
}

fn render_fuse_human(out: &FuseOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.results.is_empty() {
        writeln!(w, "No results for '{}'", out.query)?;
        return Ok(());
    }

    pretty_section(
        w,
        &format!("{} result(s) in {} for '{}'", out.count, out.folder, out.query),
    )?;
    pretty_kv(
        w,
        "Weights",
        format!(
            "semantic {:.2} / keyword {:.2}",
            out.weights.semantic, out.weights.keyword
        ),
    )?;
    writeln!(w)?;
    writeln!(w, "{:>5}  {:>8}  {:>8}  SUBJECT", "RANK", "ID", "SCORE")?;
    for row in &out.results {
        let subject = row
            .record
            .as_ref()
            .and_then(|r| r.subject.as_deref())
            .unwrap_or("");
        writeln!(
            w,
            "{:>5}  {:>8}  {:>8.4}  {}",
            row.rank, row.id, row.score, subject
        )?;
    }
    Ok(())
}

fn render_fuse_text(out: &FuseOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.results.is_empty() {
        writeln!(w, "advice  no-results  query={}", out.query)?;
        return Ok(());
    }

    for row in &out.results {
        writeln!(w, "{}  id={}  score={:.4}", row.rank, row.id, row.score)?;
    }
    Ok(())
}
