//! `sift evaluate`: agreement metrics across paraphrase-variant rankings.

use crate::cmd::read_json;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};
use clap::Args;
use serde::Serialize;
use sift_core::RankedList;
use sift_core::config::{EvaluationConfig, is_positive_finite};
use sift_search::{ConsistencyReport, consistency_top_k};
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(
    about = "Measure ranking consistency across query variants",
    long_about = "Compute weighted Kendall's W, weighted pairwise MSE and weighted top-k \
                  consistency over K rankings of the same query intent.\n\n\
                  Kendall's W and MSE need every list to rank the same ids; otherwise the \
                  command fails with 'unable to compare result sets'.",
    after_help = "EXAMPLES:\n    # Evaluate full-output rankings of four paraphrases\n    sift evaluate --input variants.json\n\n\
                  # Flatten the rank decay\n    sift evaluate --input variants.json --decay-rate 50\n\n\
                  # Machine-readable output\n    sift evaluate --input variants.json --format json"
)]
pub struct EvaluateArgs {
    /// JSON file holding an array of ranked lists of `{id, score}`.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Rank decay for Kendall's W and MSE weights (defaults to `evaluation.decay_rate`).
    #[arg(long, value_parser = parse_decay_rate)]
    pub decay_rate: Option<f64>,
}

fn parse_decay_rate(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if is_positive_finite(value) {
        Ok(value)
    } else {
        Err(format!("must be a positive finite number, got {value}"))
    }
}

/// Consistency at one top-k cutoff.
#[derive(Debug, Serialize)]
pub struct CutoffScore {
    pub k: usize,
    pub weight: f64,
    pub consistency: f64,
}

/// JSON envelope for evaluation output.
#[derive(Debug, Serialize)]
pub struct EvaluateOutput {
    pub lists: usize,
    pub items: usize,
    pub decay_rate: f64,
    #[serde(flatten)]
    pub report: ConsistencyReport,
    pub cutoffs: Vec<CutoffScore>,
}

/// Execute `sift evaluate`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, or the rankings
/// cover different id sets.
pub fn run_evaluate(
    args: &EvaluateArgs,
    output: OutputMode,
    config: &EvaluationConfig,
) -> anyhow::Result<()> {
    let lists: Vec<RankedList> = read_json(&args.input)?;
    let config = EvaluationConfig {
        decay_rate: args.decay_rate.unwrap_or(config.decay_rate),
        ..config.clone()
    };

    let report = match ConsistencyReport::evaluate(&lists, &config) {
        Ok(report) => report,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            return Err(e.into());
        }
    };

    let cutoffs = config
        .consistency_cutoffs
        .iter()
        .map(|cutoff| CutoffScore {
            k: cutoff.k,
            weight: cutoff.weight,
            consistency: consistency_top_k(&lists, cutoff.k),
        })
        .collect();

    let evaluate_output = EvaluateOutput {
        lists: lists.len(),
        items: lists.first().map_or(0, Vec::len),
        decay_rate: config.decay_rate,
        report,
        cutoffs,
    };

    render_mode(
        output,
        &evaluate_output,
        |out, w| render_evaluate_text(out, w),
        |out, w| render_evaluate_human(out, w),
    )
}

fn render_evaluate_human(out: &EvaluateOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Consistency over {} list(s) of {} item(s)", out.lists, out.items),
    )?;
    pretty_kv(w, "Kendall's W", format!("{:.4}", out.report.kendalls_w))?;
    pretty_kv(w, "Pairwise MSE", format!("{:.4}", out.report.pairwise_mse))?;
    pretty_kv(
        w,
        "Consistency@k",
        format!("{:.4}", out.report.weighted_consistency),
    )?;
    for cutoff in &out.cutoffs {
        pretty_kv(
            w,
            &format!("  @{}", cutoff.k),
            format!("{:.4} (weight {})", cutoff.consistency, cutoff.weight),
        )?;
    }
    pretty_kv(w, "Decay rate", out.decay_rate.to_string())
}

fn render_evaluate_text(out: &EvaluateOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "kendalls_w={:.4}  pairwise_mse={:.4}  consistency={:.4}  lists={}  items={}",
        out.report.kendalls_w,
        out.report.pairwise_mse,
        out.report.weighted_consistency,
        out.lists,
        out.items
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(clap::Parser, Debug)]
    struct Wrapper {
        #[command(flatten)]
        args: EvaluateArgs,
    }

    #[test]
    fn decay_rate_flag_accepts_positive_values() {
        use clap::Parser;

        let w = Wrapper::parse_from(["test", "-i", "v.json", "--decay-rate", "2.5"]);
        assert_eq!(w.args.decay_rate, Some(2.5));
    }

    #[test]
    fn decay_rate_flag_rejects_zero_negative_and_nan() {
        use clap::Parser;

        for raw in ["0", "-3", "NaN", "inf", "fast"] {
            let result = Wrapper::try_parse_from(["test", "-i", "v.json", "--decay-rate", raw]);
            assert!(result.is_err(), "accepted --decay-rate {raw}");
        }
    }

    fn sample() -> EvaluateOutput {
        EvaluateOutput {
            lists: 3,
            items: 20,
            decay_rate: 20.0,
            report: ConsistencyReport {
                kendalls_w: 0.9,
                pairwise_mse: 0.05,
                weighted_consistency: 0.8,
            },
            cutoffs: vec![CutoffScore {
                k: 10,
                weight: 0.7,
                consistency: 0.8,
            }],
        }
    }

    #[test]
    fn json_flattens_report_fields() {
        let value = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(value["kendalls_w"], 0.9);
        assert_eq!(value["cutoffs"][0]["k"], 10);
        assert!(value.get("report").is_none());
    }

    #[test]
    fn text_is_one_line() {
        let mut buf = Vec::new();
        render_evaluate_text(&sample(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "kendalls_w=0.9000  pairwise_mse=0.0500  consistency=0.8000  lists=3  items=20\n"
        );
    }

    #[test]
    fn human_shows_each_cutoff() {
        let mut buf = Vec::new();
        render_evaluate_human(&sample(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Kendall's W:"));
        assert!(text.contains("@10:"));
    }
}
