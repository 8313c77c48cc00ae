//! Domain-level error taxonomy for Check Mate.

use std::fmt;

use checkmate_extract::ExtractError;

use crate::gateway::GatewayError;

/// Why a model response could not become a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    /// Not JSON, even after the quote repair pass.
    Syntax,
    /// JSON, but not the expected payload shape.
    Schema,
    /// A status outside the closed verdict set (or no status at all).
    UnknownStatus,
    /// Two entries claim the same requirement index, or an index is 0.
    DuplicateIndex,
    /// `score` outside 0..=100.
    ScoreOutOfRange,
    /// Entries do not cover exactly the submitted requirements.
    Coverage,
}

impl fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseFailureKind::Syntax => "syntax",
            ParseFailureKind::Schema => "schema",
            ParseFailureKind::UnknownStatus => "unknown status",
            ParseFailureKind::DuplicateIndex => "duplicate index",
            ParseFailureKind::ScoreOutOfRange => "score out of range",
            ParseFailureKind::Coverage => "coverage",
        };
        f.write_str(name)
    }
}

/// Model output that could not be turned into a report. Keeps the raw text
/// for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model response rejected ({kind}): {detail}")]
pub struct ParseFailure {
    pub kind: ParseFailureKind,
    pub detail: String,
    pub raw: String,
}

impl ParseFailure {
    pub fn new(kind: ParseFailureKind, detail: impl Into<String>, raw: &str) -> Self {
        Self {
            kind,
            detail: detail.into(),
            raw: raw.to_string(),
        }
    }
}

/// Check Mate domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckmateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("parse failure: {0}")]
    Parse(#[from] ParseFailure),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Check Mate domain operations.
pub type Result<T> = std::result::Result<T, CheckmateError>;
