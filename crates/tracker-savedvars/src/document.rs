//! Whole-file document model: ordered top-level global assignments.

use crate::encode::write_value;
use crate::parse::parse_globals;
use crate::{LuaValue, SavedVarsError, SavedVarsResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// A parsed SavedVariables document.
///
/// The file declares one or more named globals (the addon's run database
/// and, optionally, its aggregate counters). The document keeps them in
/// source order so a cursor update is a read-modify-write of one key, not
/// a regeneration of unrelated structure.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedVariables {
    globals: Vec<(String, LuaValue)>,
}

impl SavedVariables {
    /// Parse document text (`Name = { ... }` assignments).
    pub fn parse(text: &str) -> SavedVarsResult<Self> {
        let globals = parse_globals(text)?;
        Ok(Self { globals })
    }

    /// Read and parse a SavedVariables file.
    pub fn load(path: &Path) -> SavedVarsResult<Self> {
        let text = fs::read_to_string(path)?;
        let doc = Self::parse(&text)?;
        debug!(path = %path.display(), globals = doc.globals.len(), "SavedVariables loaded");
        Ok(doc)
    }

    /// Re-encode and write the document, replacing the file atomically
    /// (temp file in the same directory, then rename).
    pub fn save(&self, path: &Path) -> SavedVarsResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SavedVarsError::Io(std::io::Error::other("invalid file name")))?;
        let tmp_name = format!(
            ".{}.mptsync.tmp.{}",
            file_name,
            std::time::SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let tmp_path = dir.join(tmp_name);

        let write_result = (|| -> std::io::Result<()> {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp_path)?;
            file.write_all(self.to_lua().as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        debug!(path = %path.display(), "SavedVariables rewritten");
        Ok(())
    }

    /// Render the whole document as SavedVariables text.
    pub fn to_lua(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.globals {
            out.push_str(name);
            out.push_str(" = ");
            write_value(&mut out, value, 1);
            out.push('\n');
        }
        out
    }

    pub fn globals(&self) -> &[(String, LuaValue)] {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<&LuaValue> {
        self.globals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn global_mut(&mut self, name: &str) -> Option<&mut LuaValue> {
        self.globals
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Like [`global`](Self::global) but fails with the global's name.
    pub fn require_global(&self, name: &str) -> SavedVarsResult<&LuaValue> {
        self.global(name)
            .ok_or_else(|| SavedVarsError::GlobalNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
MPT_DB = {
    ["runs"] = {
        {
            ["mapName"] = "The Dawnbreaker",
            ["level"] = 12,
        }, -- [1]
    },
    ["unsynced"] = {},
}
MPT_CounterDB = {
    ["started"] = 4,
    ["completed"] = 3,
    ["incomplete"] = 1,
}
"#;

    #[test]
    fn parses_both_globals() {
        let doc = SavedVariables::parse(SAMPLE).unwrap();
        assert_eq!(doc.globals().len(), 2);
        let db = doc.global("MPT_DB").unwrap();
        assert_eq!(db.get("runs").and_then(|r| r.as_seq()).unwrap().len(), 1);
        assert!(doc.global("MPT_CounterDB").is_some());
        assert!(doc.global("MISSING").is_none());
    }

    #[test]
    fn tolerates_single_global() {
        let doc = SavedVariables::parse("MPT_DB = { [\"runs\"] = {} }\n").unwrap();
        assert_eq!(doc.globals().len(), 1);
    }

    #[test]
    fn require_global_names_the_missing_one() {
        let doc = SavedVariables::parse("MPT_DB = {}\n").unwrap();
        let err = doc.require_global("MPT_CounterDB").unwrap_err();
        assert!(matches!(err, SavedVarsError::GlobalNotFound(name) if name == "MPT_CounterDB"));
    }

    #[test]
    fn document_round_trip() {
        let doc = SavedVariables::parse(SAMPLE).unwrap();
        let reparsed = SavedVariables::parse(&doc.to_lua()).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn mutation_survives_round_trip() {
        let mut doc = SavedVariables::parse(SAMPLE).unwrap();
        doc.global_mut("MPT_DB")
            .unwrap()
            .set("unsynced", LuaValue::Seq(vec![LuaValue::Int(1)]));
        let reparsed = SavedVariables::parse(&doc.to_lua()).unwrap();
        let cursor = reparsed
            .global("MPT_DB")
            .unwrap()
            .get("unsynced")
            .unwrap()
            .as_seq()
            .unwrap()
            .to_vec();
        assert_eq!(cursor, vec![LuaValue::Int(1)]);
        // Unrelated structure is preserved.
        assert!(reparsed.global("MPT_CounterDB").is_some());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MPlusTracker.lua");
        let doc = SavedVariables::parse(SAMPLE).unwrap();
        doc.save(&path).unwrap();
        let loaded = SavedVariables::load(&path).unwrap();
        assert_eq!(doc, loaded);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = SavedVariables::load(Path::new("/nonexistent/MPlusTracker.lua")).unwrap_err();
        assert!(matches!(err, SavedVarsError::Io(_)));
    }
}
