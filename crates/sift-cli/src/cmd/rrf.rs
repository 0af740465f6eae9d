//! `sift rrf`: Reciprocal Rank Fusion over K variant rankings.

use crate::cmd::read_json;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use clap::Args;
use serde::Serialize;
use sift_core::config::FusionConfig;
use sift_core::{Candidate, RankedList};
use sift_search::reciprocal_rank_fusion;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(
    about = "Fuse variant rankings with Reciprocal Rank Fusion",
    long_about = "Fuse K rankings of the same query (one per paraphrase) into a single ranking.\n\n\
                  Each list contributes 1 / (k + rank + 1) per id, with rank 0-based. \
                  Input scores are ignored; only order matters.",
    after_help = "EXAMPLES:\n    # Fuse rankings from a JSON array of lists\n    sift rrf --input variants.json\n\n\
                  # Sharpen the top of the ranking\n    sift rrf --input variants.json --k 10\n\n\
                  # Machine-readable output\n    sift rrf --input variants.json --json"
)]
pub struct RrfArgs {
    /// JSON file holding an array of ranked lists of `{id, score}`.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Damping constant (defaults to `fusion.rrf_k`, normally 60).
    #[arg(long)]
    pub k: Option<usize>,
}

/// JSON envelope for RRF output.
#[derive(Debug, Serialize)]
pub struct RrfOutput {
    pub k: usize,
    pub lists: usize,
    pub count: usize,
    pub results: Vec<Candidate>,
}

/// Execute `sift rrf`.
///
/// # Errors
///
/// Returns an error if the input file cannot be read or parsed.
pub fn run_rrf(args: &RrfArgs, output: OutputMode, config: &FusionConfig) -> anyhow::Result<()> {
    let lists: Vec<RankedList> = read_json(&args.input)?;
    let k = args.k.unwrap_or(config.rrf_k);
    let results = reciprocal_rank_fusion(&lists, k);

    let rrf_output = RrfOutput {
        k,
        lists: lists.len(),
        count: results.len(),
        results,
    };

    render_mode(
        output,
        &rrf_output,
        |out, w| render_rrf_text(out, w),
        |out, w| render_rrf_human(out, w),
    )
}

fn render_rrf_human(out: &RrfOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Fused {} list(s)", out.lists))?;
    pretty_kv(w, "k", out.k.to_string())?;
    pretty_kv(w, "Candidates", out.count.to_string())?;
    writeln!(w)?;
    writeln!(w, "{:>6}  {:>10}  {:>12}", "RANK", "ID", "RRF SCORE")?;
    for (idx, c) in out.results.iter().enumerate() {
        writeln!(w, "{:>6}  {:>10}  {:>12.6}", idx + 1, c.id, c.score)?;
    }
    Ok(())
}

fn render_rrf_text(out: &RrfOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for (idx, c) in out.results.iter().enumerate() {
        writeln!(w, "{}  id={}  score={:.6}", idx + 1, c.id, c.score)?;
    }
    Ok(())
}
