//! Export error types.

use thiserror::Error;
use tracker_database::DatabaseError;

/// Spreadsheet export failure.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook construction or save error
    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Storage gateway error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type alias using ExportError.
pub type ExportResult<T> = Result<T, ExportError>;
