//! Reconciler error types.

use thiserror::Error;
use tracker_database::DatabaseError;
use tracker_savedvars::SavedVarsError;

/// Reconciliation failure.
///
/// Per-run normalization problems are not errors at this level; they are
/// counted in the report and the batch continues.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Cursor names a run index outside the recorded range
    #[error("cursor index {index} outside run range 1..={run_count}")]
    CursorOutOfRange { index: i64, run_count: usize },

    /// Cursor list holds something other than integers
    #[error("cursor entry is not an integer (got {0})")]
    BadCursorEntry(&'static str),

    /// The `runs` key is present but not a sequence
    #[error("run collection is not a sequence (got {0})")]
    BadRunCollection(&'static str),

    /// SavedVariables parse or I/O error
    #[error(transparent)]
    SavedVars(#[from] SavedVarsError),

    /// Storage gateway error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
