//! Sync reconciler: drives cursor-selected runs from a SavedVariables
//! document into the database, then clears the cursor and rewrites the
//! file so repeat passes are database no-ops.

mod cursor;
mod error;
mod reconcile;

pub use cursor::CURSOR_KEY;
pub use error::{SyncError, SyncResult};
pub use reconcile::{reconcile, sync_file, SyncReport, RUNS_KEY};
