//! The reconciliation loop: cursor-selected runs in, database rows out,
//! cursor cleared in the document.

use tracing::{debug, info, warn};

use tracker_database::{ConflictPolicy, Database, UpsertOutcome};
use tracker_normalize::normalize_run;
use tracker_savedvars::{LuaValue, SavedVariables};

use crate::cursor;
use crate::error::{SyncError, SyncResult};

/// Key on the primary global holding the recorded run sequence.
pub const RUNS_KEY: &str = "runs";

/// Per-pass tally, logged by the binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Indices selected by the cursor (or the full range).
    pub selected: usize,
    /// New run rows created.
    pub inserted: usize,
    /// Existing rows refreshed under the update policy.
    pub updated: usize,
    /// Collisions left untouched under the skip policy.
    pub skipped: usize,
    /// Runs dropped by normalization failures.
    pub failed: usize,
}

impl SyncReport {
    /// True when the pass left the database untouched.
    pub fn is_database_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0
    }
}

/// Reconcile the decoded document against the database.
///
/// Processes the cursor-selected runs of `primary_global`, then resets the
/// cursor to empty in the document. The caller is responsible for writing
/// the document back to disk (see [`sync_file`]). Normalization failures
/// are logged and counted, not propagated; cursor corruption is fatal
/// before any database write.
pub fn reconcile(
    doc: &mut SavedVariables,
    primary_global: &str,
    db: &mut Database,
    policy: ConflictPolicy,
) -> SyncResult<SyncReport> {
    let mut report = SyncReport::default();

    {
        let global = doc.require_global(primary_global)?;
        let runs: &[LuaValue] = match global.get(RUNS_KEY) {
            Some(LuaValue::Seq(items)) => items,
            Some(LuaValue::Nil) | None => &[],
            Some(other) => return Err(SyncError::BadRunCollection(other.type_name())),
        };

        if runs.is_empty() {
            debug!("no recorded runs, clearing cursor only");
        } else {
            let indices = cursor::selected_indices(global, runs.len())?;
            report.selected = indices.len();

            for index in indices {
                let run = match normalize_run(&runs[index - 1]) {
                    Ok(run) => run,
                    Err(err) => {
                        warn!(index, "dropping run: {err}");
                        report.failed += 1;
                        continue;
                    }
                };
                match db.insert_run_with_party(&run, policy)? {
                    UpsertOutcome::Inserted(id) => {
                        debug!(index, run_id = %id, character = %run.character, "run inserted");
                        report.inserted += 1;
                    }
                    UpsertOutcome::Updated(id) => {
                        debug!(index, run_id = %id, "run updated in place");
                        report.updated += 1;
                    }
                    UpsertOutcome::Skipped => report.skipped += 1,
                }
            }
        }
    }

    // require_global above guarantees the global exists.
    if let Some(global) = doc.global_mut(primary_global) {
        cursor::clear(global);
    }
    Ok(report)
}

/// Full file-to-database pass: load, reconcile, write the cursor-cleared
/// document back. The file is rewritten even when the database saw no
/// changes, so a repeat pass stays a database no-op.
pub fn sync_file(
    path: &std::path::Path,
    primary_global: &str,
    db: &mut Database,
    policy: ConflictPolicy,
) -> SyncResult<SyncReport> {
    let mut doc = SavedVariables::load(path)?;
    let report = reconcile(&mut doc, primary_global, db, policy)?;
    doc.save(path)?;
    info!(
        selected = report.selected,
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "sync pass finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CURSOR_KEY;
    use std::fs;
    use tempfile::tempdir;

    const PRIMARY: &str = "MPT_DB";

    const SAMPLE: &str = r#"
MPT_DB = {
    ["runs"] = {
        {
            ["character"] = "Drwn",
            ["level"] = 12,
            ["mapName"] = "The Dawnbreaker",
            ["startTime"] = "2024-01-01 00:00:00",
            ["completionTime"] = 1634000,
            ["party"] = {
                { ["role"] = "TANK", ["name"] = "Pallytank", ["class"] = "PALADIN" },
                { ["role"] = "DAMAGER", ["name"] = "Drwn*", ["class"] = "SHAMAN" },
            },
        }, -- [1]
        {
            ["character"] = "Drwn",
            ["level"] = 14,
            ["mapName"] = "Grim Batol",
            ["startTime"] = "2024-01-02 00:00:00",
        }, -- [2]
    },
}
"#;

    fn doc(text: &str) -> SavedVariables {
        SavedVariables::parse(text).unwrap()
    }

    #[test]
    fn full_resync_without_cursor() {
        let mut db = Database::open_in_memory().unwrap();
        let mut doc = doc(SAMPLE);

        let report = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(db.count_runs().unwrap(), 2);

        // Cursor written back as the empty list.
        let cursor = doc.global(PRIMARY).unwrap().get(CURSOR_KEY).unwrap();
        assert_eq!(cursor, &LuaValue::Seq(Vec::new()));
    }

    #[test]
    fn explicit_cursor_limits_selection() {
        let mut db = Database::open_in_memory().unwrap();
        let text = SAMPLE.replace("    [\"runs\"]", "    [\"unsynced\"] = { 2 },\n    [\"runs\"]");
        let mut doc = doc(&text);

        let report = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert_eq!(report.selected, 1);
        assert_eq!(report.inserted, 1);

        let records = db.runs_for_character("Drwn").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].map_name, "Grim Batol");
    }

    #[test]
    fn second_pass_is_database_noop() {
        let mut db = Database::open_in_memory().unwrap();
        let mut doc = doc(SAMPLE);
        reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();

        let mut again = SavedVariables::parse(SAMPLE).unwrap();
        let report = reconcile(&mut again, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert!(report.is_database_noop());
        assert_eq!(report.skipped, 2);
        assert_eq!(db.count_runs().unwrap(), 2);
        assert_eq!(db.count_party_rows().unwrap(), 2);
    }

    #[test]
    fn out_of_range_cursor_commits_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let text = SAMPLE.replace("    [\"runs\"]", "    [\"unsynced\"] = { 1, 99 },\n    [\"runs\"]");
        let mut doc = doc(&text);

        let err = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap_err();
        assert!(matches!(err, SyncError::CursorOutOfRange { index: 99, .. }));
        assert_eq!(db.count_runs().unwrap(), 0);
    }

    #[test]
    fn malformed_run_is_counted_not_fatal() {
        let mut db = Database::open_in_memory().unwrap();
        let mut doc = doc(
            r#"
MPT_DB = {
    ["runs"] = {
        { ["mapName"] = "Ara-Kara" },
        { ["mapName"] = "Grim Batol", ["startTime"] = "2024-01-02 00:00:00" },
    },
}
"#,
        );
        let report = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.inserted, 1);
    }

    #[test]
    fn empty_run_collection_only_clears_cursor() {
        let mut db = Database::open_in_memory().unwrap();
        let mut doc = doc("MPT_DB = { [\"runs\"] = {}, [\"unsynced\"] = {} }\n");
        let report = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(db.count_runs().unwrap(), 0);
    }

    #[test]
    fn missing_primary_global_is_fatal() {
        let mut db = Database::open_in_memory().unwrap();
        let mut doc = doc("MPT_CounterDB = { [\"started\"] = 1 }\n");
        let err = reconcile(&mut doc, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap_err();
        assert!(matches!(err, SyncError::SavedVars(_)));
    }

    #[test]
    fn sync_file_rewrites_with_cleared_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MPlusTracker.lua");
        let text = SAMPLE.replace("    [\"runs\"]", "    [\"unsynced\"] = { 1, 2 },\n    [\"runs\"]");
        fs::write(&path, &text).unwrap();

        let mut db = Database::open_in_memory().unwrap();
        let report = sync_file(&path, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert_eq!(report.inserted, 2);

        let rewritten = SavedVariables::load(&path).unwrap();
        let cursor = rewritten.global(PRIMARY).unwrap().get(CURSOR_KEY).unwrap();
        assert_eq!(cursor, &LuaValue::Seq(Vec::new()));
        // Run data survives the rewrite.
        let runs = rewritten.global(PRIMARY).unwrap().get(RUNS_KEY).unwrap();
        assert_eq!(runs.as_seq().unwrap().len(), 2);

        // Second pass over the rewritten file touches nothing.
        let report = sync_file(&path, PRIMARY, &mut db, ConflictPolicy::Skip).unwrap();
        assert!(report.is_database_noop());
        assert_eq!(report.selected, 0);
    }
}
