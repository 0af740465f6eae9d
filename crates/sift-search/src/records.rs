//! Corpus partitions and presentation-time record attachment.
//!
//! Fusion only ever sees `(id, score)` pairs. Once a final ranking exists,
//! [`attach_records`] pairs each candidate with its full record as an
//! immutable [`ScoredRecord`]; the corpus itself is never modified.

use anyhow::{Context, Result};
use sift_core::{Candidate, CorpusRecord, Folder, ScoredRecord, SiftError};
use std::path::Path;
use tracing::{debug, info};

/// Maps a dense per-folder id (`1..=N`) to its full record.
pub trait CorpusAccessor {
    fn record(&self, id: u32) -> Option<&CorpusRecord>;

    /// Partition size `N`.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory corpus partition for one folder.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    folder: Folder,
    records: Vec<CorpusRecord>,
}

impl Corpus {
    /// Build a partition, checking that ids run `1..=N` without gaps and
    /// that every record belongs to `folder`.
    ///
    /// Records may arrive in any order.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::CorpusInvalid`] on a gap, a duplicate id, or a
    /// record from another folder.
    pub fn from_records(
        folder: Folder,
        mut records: Vec<CorpusRecord>,
    ) -> Result<Self, SiftError> {
        records.sort_by_key(|r| r.id);
        for (idx, record) in records.iter().enumerate() {
            let expected = idx + 1;
            if record.id as usize != expected {
                return Err(SiftError::CorpusInvalid {
                    reason: format!("expected id {expected}, found {}", record.id),
                });
            }
            if record.folder != folder {
                return Err(SiftError::CorpusInvalid {
                    reason: format!(
                        "record {} belongs to {}, not {folder}",
                        record.id, record.folder
                    ),
                });
            }
        }
        Ok(Self { folder, records })
    }

    /// Load the `folder` partition from a JSON array of records.
    ///
    /// Records of other folders in the same file are skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or the partition is not
    /// densely numbered.
    pub fn load_json(path: &Path, folder: Folder) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
        let all: Vec<CorpusRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse corpus file {}", path.display()))?;
        let total = all.len();
        let records: Vec<CorpusRecord> = all.into_iter().filter(|r| r.folder == folder).collect();

        let corpus = Self::from_records(folder, records)
            .with_context(|| format!("Invalid {folder} partition in {}", path.display()))?;
        info!(
            path = %path.display(),
            %folder,
            records = corpus.len(),
            skipped = total - corpus.len(),
            "loaded corpus partition"
        );
        Ok(corpus)
    }

    #[must_use]
    pub const fn folder(&self) -> Folder {
        self.folder
    }

    pub fn records(&self) -> impl Iterator<Item = &CorpusRecord> {
        self.records.iter()
    }
}

impl CorpusAccessor for Corpus {
    fn record(&self, id: u32) -> Option<&CorpusRecord> {
        (id as usize)
            .checked_sub(1)
            .and_then(|idx| self.records.get(idx))
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Pair each ranked candidate with its record, keeping rank order.
///
/// Ranks in the output are 1-based.
///
/// # Errors
///
/// Returns [`SiftError::RecordNotFound`] if the accessor has no record for a
/// ranked id, which means the ranking was built against another corpus.
pub fn attach_records<A>(
    ranked: &[Candidate],
    accessor: &A,
) -> Result<Vec<ScoredRecord>, SiftError>
where
    A: CorpusAccessor + ?Sized,
{
    let attached = ranked
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let record = accessor
                .record(candidate.id)
                .ok_or(SiftError::RecordNotFound { id: candidate.id })?;
            Ok(ScoredRecord {
                rank: idx + 1,
                score: candidate.score,
                record: record.clone(),
            })
        })
        .collect::<Result<Vec<_>, SiftError>>()?;
    debug!(records = attached.len(), "attached corpus records");
    Ok(attached)
}
