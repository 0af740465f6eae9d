//! Candidates, ranked lists, and the email records they point at.
//!
//! Candidate ids are dense `1..=N` indices assigned per folder partition for
//! the lifetime of a session. They are positions, not database keys: id `i`
//! always lives at index `i - 1` of a dense score vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One corpus item's relevance to a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Dense per-folder id, starting at 1.
    pub id: u32,
    /// Source-specific relevance score (higher is better).
    pub score: f64,
}

impl Candidate {
    #[must_use]
    pub const fn new(id: u32, score: f64) -> Self {
        Self { id, score }
    }
}

impl From<(u32, f64)> for Candidate {
    fn from((id, score): (u32, f64)) -> Self {
        Self { id, score }
    }
}

/// Ordered candidates, best first.
///
/// Externally supplied lists may be sparse (a keyword engine only returns
/// matches); fusion works on dense score vectors built from them.
pub type RankedList = Vec<Candidate>;

/// Mailbox folder a corpus partition was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Folder {
    #[default]
    Inbox,
    Sent,
}

impl Folder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Sent => "sent",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Folder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "sent" => Ok(Self::Sent),
            other => Err(format!("unknown folder '{other}' (expected inbox or sent)")),
        }
    }
}

/// A single email as stored in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: u32,
    #[serde(default)]
    pub folder: Folder,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub date_sent: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl CorpusRecord {
    /// A record with only its id and folder set.
    #[must_use]
    pub const fn bare(id: u32, folder: Folder) -> Self {
        Self {
            id,
            folder,
            from: None,
            to: None,
            cc: None,
            date_sent: None,
            subject: None,
            body: None,
        }
    }
}

/// A corpus record paired with the transient score it earned for one query.
///
/// Built only at presentation time; the score is never written back into the
/// corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    /// 1-based position in the final ranking.
    pub rank: usize,
    pub score: f64,
    pub record: CorpusRecord,
}
