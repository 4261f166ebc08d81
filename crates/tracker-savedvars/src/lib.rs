//! SavedVariables decoding for the MPlusTracker sync pipeline.
//!
//! This crate turns the addon's SavedVariables text into a tree of
//! language-neutral values and back:
//! - Tables with contiguous `1..=N` integer keys decode as ordered
//!   sequences; all other tables as ordered string-keyed maps.
//! - The document model keeps every top-level global assignment, so the
//!   sync cursor can be rewritten without disturbing the rest of the file.
//! - Saving replaces the file atomically (temp file + rename).
//!
//! It is deliberately not a Lua interpreter: only the table-constructor
//! subset the game serializer emits is accepted, and malformed input
//! fails with the offending fragment.

mod document;
mod encode;
mod error;
mod parse;
mod value;

pub use document::SavedVariables;
pub use encode::encode_value;
pub use error::{SavedVarsError, SavedVarsResult};
pub use parse::parse_value;
pub use value::LuaValue;
