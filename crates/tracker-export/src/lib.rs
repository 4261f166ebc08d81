//! Spreadsheet export: one class-colored worksheet per tracked character.

mod colors;
mod error;
mod workbook;

pub use colors::class_color;
pub use error::{ExportError, ExportResult};
pub use workbook::export_workbook;
