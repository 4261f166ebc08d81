//! Sync cursor resolution and write-back.
//!
//! The addon appends the 1-based indices of runs it has recorded since the
//! last sync to an `unsynced` list on the primary global. An absent cursor
//! means a full resync of every recorded run.

use tracker_savedvars::LuaValue;

use crate::error::{SyncError, SyncResult};

/// Key on the primary global carrying the unsynced run indices.
pub const CURSOR_KEY: &str = "unsynced";

/// Resolve the ordered list of 1-based run indices to process.
///
/// Any cursor entry outside `1..=run_count` is fatal; nothing gets
/// persisted from a batch with a corrupt cursor.
pub(crate) fn selected_indices(global: &LuaValue, run_count: usize) -> SyncResult<Vec<usize>> {
    match global.get(CURSOR_KEY) {
        None | Some(LuaValue::Nil) => Ok((1..=run_count).collect()),
        Some(LuaValue::Seq(entries)) => {
            let mut indices = Vec::with_capacity(entries.len());
            for entry in entries {
                let index = entry
                    .as_i64()
                    .ok_or(SyncError::BadCursorEntry(entry.type_name()))?;
                if index < 1 || index as usize > run_count {
                    return Err(SyncError::CursorOutOfRange {
                        index,
                        run_count,
                    });
                }
                indices.push(index as usize);
            }
            Ok(indices)
        }
        Some(other) => Err(SyncError::BadCursorEntry(other.type_name())),
    }
}

/// Reset the cursor to the empty list.
///
/// An empty primary global decodes as a sequence; promote it to a map so
/// the cursor still lands in the rewritten file.
pub(crate) fn clear(global: &mut LuaValue) {
    if global.as_map().is_none() {
        *global = LuaValue::Map(Vec::new());
    }
    global.set(CURSOR_KEY, LuaValue::Seq(Vec::new()));
}
