//! Error types for the vaxpep library.

use std::fmt;

use thiserror::Error;

/// Errors that abort a run: unreadable inputs, malformed data, or a run that
/// produced nothing.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A JSON document could not be decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A parse error occurred while reading input data.
    #[error("{0}")]
    Parse(String),

    /// A validation constraint was violated.
    #[error("{0}")]
    Validation(String),

    /// A file format error was detected.
    #[error("{0}")]
    Format(String),

    /// Not a single variant yielded a usable peptide.
    #[error("no mutations produced any peptide: {0}")]
    NoPeptides(String),
}

/// How loudly a per-variant failure should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Failure to turn one variant into a peptide on one transcript.
///
/// None of these stop the run; the caller records them in the mutation report
/// and moves on to the next transcript or variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    #[error("unknown transcript {0}")]
    UnknownTranscript(String),

    #[error("transcript {0} has no exons")]
    NoExons(String),

    #[error("position {position} not translatable on {transcript_id}: {reason}")]
    Coordinate {
        transcript_id: String,
        position: u32,
        reason: String,
    },

    #[error(
        "reference mismatch on {transcript_id} at index {index}: expected '{expected}', found '{found}'"
    )]
    ReferenceMismatch {
        transcript_id: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("no {kind} sequence available for {transcript_id}")]
    MissingSequence {
        transcript_id: String,
        kind: &'static str,
    },

    #[error("stop codon in mutant peptide {peptide} from {transcript_id}")]
    PrematureStop {
        transcript_id: String,
        peptide: String,
    },

    #[error("invalid residue '{residue}' in peptide {peptide} from {transcript_id}")]
    InvalidResidue {
        transcript_id: String,
        residue: char,
        peptide: String,
    },

    #[error("peptide from {transcript_id} has {length} residues, minimum is {min_length}")]
    TooShort {
        transcript_id: String,
        length: usize,
        min_length: usize,
    },

    #[error("synonymous change {annotation} on {transcript_id}")]
    Synonymous {
        transcript_id: String,
        annotation: String,
    },

    #[error("reference and alternate alleles are identical")]
    NoVariant,
}

impl VariantError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownTranscript(_) | Self::NoExons(_) | Self::MissingSequence { .. } => {
                Severity::Error
            }
            Self::ReferenceMismatch { .. }
            | Self::PrematureStop { .. }
            | Self::InvalidResidue { .. } => Severity::Warning,
            Self::Coordinate { .. }
            | Self::TooShort { .. }
            | Self::Synonymous { .. }
            | Self::NoVariant => Severity::Info,
        }
    }
}
