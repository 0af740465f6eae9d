#![forbid(unsafe_code)]

mod cmd;
mod output;
mod report;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use sift_core::ErrorCode;
use sift_core::config::resolve_config;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sift: hybrid rank fusion and consistency evaluation for email search",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json, FORMAT and user config).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ranking",
        about = "Fuse semantic and keyword rankings for one query",
        after_help = "EXAMPLES:\n    # Top 10 ids for a request\n    sift fuse --request query.json\n\n    # Attach records and append a report\n    sift fuse --request query.json --corpus emails.json --report top_emails.txt\n\n    # Emit machine-readable output\n    sift fuse --request query.json --json"
    )]
    Fuse(cmd::fuse::FuseArgs),

    #[command(
        next_help_heading = "Ranking",
        about = "Fuse variant rankings with Reciprocal Rank Fusion",
        after_help = "EXAMPLES:\n    # Fuse a JSON array of rankings\n    sift rrf --input variants.json\n\n    # Emit machine-readable output\n    sift rrf --input variants.json --json"
    )]
    Rrf(cmd::rrf::RrfArgs),

    #[command(
        next_help_heading = "Evaluation",
        about = "Measure ranking consistency across query variants",
        after_help = "EXAMPLES:\n    # Evaluate full-output rankings\n    sift evaluate --input variants.json\n\n    # Emit machine-readable output\n    sift evaluate --input variants.json --json"
    )]
    Evaluate(cmd::evaluate::EvaluateArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    sift completions bash\n\n    # Generate zsh completions\n    sift completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sift=debug,info"
        } else {
            "sift=info,warn"
        })
    });

    let format = env::var("SIFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, cli.json) {
        Ok(config) => config,
        Err(e) => {
            let mode = resolve_output_mode(cli.format, if cli.json { "json" } else { "text" });
            render_error(
                mode,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            )?;
            return Err(e);
        }
    };
    let output = resolve_output_mode(cli.format, &config.resolved_output);

    match cli.command {
        Commands::Fuse(ref args) => cmd::fuse::run_fuse(args, output, &config.project.fusion),
        Commands::Rrf(ref args) => cmd::rrf::run_rrf(args, output, &config.project.fusion),
        Commands::Evaluate(ref args) => {
            cmd::evaluate::run_evaluate(args, output, &config.project.evaluation)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
