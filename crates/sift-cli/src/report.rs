//! Plain-text result report, appended one query block at a time.
//!
//! ```text
//! Results in your inbox folder for the following query: lunch with alice
//!
//! Result 1
//! ______________________
//! Email ID: 42
//! Score: 0.7500
//! From: alice@example.com
//! CC'd: N/A
//! Date: 2024-03-02
//! Subject: Lunch Thursday?
//! Body Preview: Are you free ...
//!
//! ```

use anyhow::{Context, Result};
use sift_core::{Folder, ScoredRecord};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

const SUBJECT_PREVIEW_CHARS: usize = 80;
const BODY_PREVIEW_CHARS: usize = 300;
const RESULT_RULE: &str = "______________________";
const MISSING: &str = "N/A";

/// Write one query block.
pub fn write_report(
    w: &mut dyn Write,
    query: &str,
    folder: Folder,
    results: &[ScoredRecord],
) -> io::Result<()> {
    writeln!(
        w,
        "Results in your {folder} folder for the following query: {query}\n"
    )?;
    for scored in results {
        let record = &scored.record;
        let subject = record.subject.as_deref().unwrap_or("No Subject");
        let body = record.body.as_deref().unwrap_or("[No Body Content]");

        writeln!(w, "Result {}", scored.rank)?;
        writeln!(w, "{RESULT_RULE}")?;
        writeln!(w, "Email ID: {}", record.id)?;
        writeln!(w, "Score: {:.4}", scored.score)?;
        match folder {
            Folder::Inbox => writeln!(w, "From: {}", or_missing(record.from.as_deref()))?,
            Folder::Sent => writeln!(w, "To: {}", or_missing(record.to.as_deref()))?,
        }
        writeln!(w, "CC'd: {}", or_missing(record.cc.as_deref()))?;
        writeln!(w, "Date: {}", or_missing(record.date_sent.as_deref()))?;
        writeln!(w, "Subject: {}", preview(subject, SUBJECT_PREVIEW_CHARS))?;
        writeln!(w, "Body Preview: {}\n", preview(body, BODY_PREVIEW_CHARS))?;
    }
    Ok(())
}

/// Append one query block to `path`, creating the file if needed.
pub fn append_report(
    path: &Path,
    query: &str,
    folder: Folder,
    results: &[ScoredRecord],
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open report file {}", path.display()))?;
    write_report(&mut file, query, folder, results)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    info!(path = %path.display(), results = results.len(), "appended query report");
    Ok(())
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(MISSING)
}

/// First `max_chars` characters, never splitting a code point.
fn preview(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}
