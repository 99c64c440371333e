//! Error types shared by every stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the corpus, comparison and synthesis stages
#[derive(Error, Debug)]
pub enum CorpdiffError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document on line {line}: {reason}")]
    MalformedDocument { line: usize, reason: String },

    #[error(
        "Could not split columns in {}: {reason} (check the column delimiter and word separator)",
        path.display()
    )]
    AmbiguousColumns { path: PathBuf, reason: String },

    #[error("Token positions must be strictly increasing, got {position} after {previous}")]
    InvariantViolation { position: usize, previous: usize },

    #[error("Unknown join mode '{0}'. Valid modes: outer, inner, left, right")]
    UnknownJoin(String),

    #[error("Unknown filter mode '{0}'. Valid modes: keep, remove")]
    UnknownFilterMode(String),

    #[error("Invalid significance table record on line {line}: {reason}")]
    InvalidTable { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CorpdiffError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpdiffError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that should abort a whole batch rather than a single document
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CorpdiffError::Io { .. } | CorpdiffError::AmbiguousColumns { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CorpdiffError>;
