//! Decoder error types.

use thiserror::Error;

/// SavedVariables decoding/encoding error.
#[derive(Error, Debug)]
pub enum SavedVarsError {
    /// Malformed source text. Carries the offending fragment and line.
    #[error("parse error at line {line}: unexpected `{fragment}`")]
    Parse { line: usize, fragment: String },

    /// Global variable not present in the document.
    #[error("global `{0}` not found in SavedVariables document")]
    GlobalNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SavedVarsError {
    pub(crate) fn parse(line: usize, fragment: impl Into<String>) -> Self {
        Self::Parse {
            line,
            fragment: fragment.into(),
        }
    }
}

/// Result type alias using SavedVarsError.
pub type SavedVarsResult<T> = Result<T, SavedVarsError>;
