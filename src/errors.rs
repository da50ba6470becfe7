use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XltError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write translation table: {0}")]
    Csv(#[from] csv::Error),
    #[error("genome key {0} already present in the translation table")]
    DuplicateGenome(u64),
    #[error("malformed header '{header}': {reason}")]
    MalformedHeader { header: String, reason: String },
}

impl XltError {
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        XltError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, XltError>;

/// Why a reference dump line was not usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissKind {
    TooFewFields { expected: usize, found: usize },
    NonNumeric { field: usize },
    InvalidUtf8,
}

/// A reference line that was skipped; `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMiss {
    pub line: u64,
    pub kind: MissKind,
}

impl ParseMiss {
    pub fn at(line: u64, kind: MissKind) -> Self {
        ParseMiss { line, kind }
    }
}

impl fmt::Display for ParseMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MissKind::TooFewFields { expected, found } => write!(
                f,
                "line {}: expected at least {} fields, found {}",
                self.line, expected, found
            ),
            MissKind::NonNumeric { field } => {
                write!(f, "line {}: field {} is not numeric", self.line, field)
            }
            MissKind::InvalidUtf8 => write!(f, "line {}: not valid UTF-8", self.line),
        }
    }
}
