use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    RankingSetMismatch,
    CandidateOutOfRange,
    InvalidSelection,
    RecordNotFound,
    CorpusInvalid,
    RetrievalFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::RankingSetMismatch => "E4001",
            Self::CandidateOutOfRange => "E4002",
            Self::InvalidSelection => "E4003",
            Self::RecordNotFound => "E4004",
            Self::CorpusInvalid => "E4005",
            Self::RetrievalFailed => "E6001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::RankingSetMismatch => "Unable to compare result sets",
            Self::CandidateOutOfRange => "Candidate id outside corpus partition",
            Self::InvalidSelection => "Invalid result selection",
            Self::RecordNotFound => "Corpus record not found",
            Self::CorpusInvalid => "Corpus partition is not densely numbered",
            Self::RetrievalFailed => "Retrieval backend failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax or out-of-range values in .sift/config.toml and retry."),
            Self::RankingSetMismatch => Some(
                "Run every query variant against the same corpus snapshot before comparing.",
            ),
            Self::CandidateOutOfRange => {
                Some("Ids must lie in 1..=N for the folder that was searched.")
            }
            Self::InvalidSelection => Some("Request at least one result, or ask for full output."),
            Self::RecordNotFound => Some("Reload the corpus partition the ranking was built from."),
            Self::CorpusInvalid => Some("Renumber the folder so ids run 1..N without gaps."),
            Self::RetrievalFailed => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Structural precondition violations raised by the fusion core.
///
/// Degenerate inputs (empty lists, constant scores, fewer than two variants)
/// are not errors; they produce documented sentinel values instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiftError {
    /// Two rankings that must cover the same id set do not.
    #[error(
        "ranking set mismatch: list {list_index} has {actual} ids, expected {expected} \
         ({missing} missing, {unexpected} unexpected)"
    )]
    RankingSetMismatch {
        list_index: usize,
        expected: usize,
        actual: usize,
        missing: usize,
        unexpected: usize,
    },

    /// A sparse candidate id falls outside `1..=num_items`.
    #[error("candidate id {id} is outside the corpus partition 1..={num_items}")]
    CandidateOutOfRange { id: u32, num_items: usize },

    /// Top-N selection with `num_wanted == 0` and no full output.
    #[error("num_wanted must be positive unless full output is requested")]
    InvalidSelection,

    /// The corpus accessor has no record for a ranked id.
    #[error("no corpus record for id {id}")]
    RecordNotFound { id: u32 },

    /// A corpus partition failed validation.
    #[error("invalid corpus partition: {reason}")]
    CorpusInvalid { reason: String },
}

impl SiftError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::RankingSetMismatch { .. } => ErrorCode::RankingSetMismatch,
            Self::CandidateOutOfRange { .. } => ErrorCode::CandidateOutOfRange,
            Self::InvalidSelection => ErrorCode::InvalidSelection,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::CorpusInvalid { .. } => ErrorCode::CorpusInvalid,
        }
    }

    /// Remediation text suitable for a CLI `suggestion:` line.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or("No automated remediation available.")
            .to_string()
    }
}
