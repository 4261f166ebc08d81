//! SQLite-backed storage gateway.
//!
//! All writes for one run (the run row plus its party rows) happen inside
//! a single transaction, so a crash mid-sync never leaves a run without
//! its party.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection};
use tracing::{debug, warn};
use uuid::Uuid;

use tracker_model::{format_timestamp, timestamp_from_str, PartyMember, Role, Run, RunRecord};

use crate::error::{DatabaseError, DatabaseResult};
use crate::migrations::run_migrations;

/// What to do when an incoming run collides with a stored one on
/// `(character, start_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Refresh the stored run's derived fields.
    Update,
    /// Leave the stored run untouched.
    #[default]
    Skip,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Update => "update",
            ConflictPolicy::Skip => "skip",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "update" => ConflictPolicy::Update,
            _ => ConflictPolicy::Skip,
        }
    }
}

/// Outcome of persisting one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new run row was created.
    Inserted(String),
    /// An existing run row was refreshed in place.
    Updated(String),
    /// An existing run row was left untouched.
    Skipped,
}

impl UpsertOutcome {
    /// Id of the affected run row, if any.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => Some(id),
            UpsertOutcome::Skipped => None,
        }
    }
}

/// Storage gateway over one SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if necessary) the database at the given path and
    /// bring its schema up to date.
    pub fn open(path: &Path) -> DatabaseResult<Self> {
        debug!("opening database at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open with bounded retries. SQLite reports `database is locked`
    /// when another process holds the write lock; retrying with backoff
    /// covers a sync racing a manual inspection session.
    pub fn open_with_retry(path: &Path, attempts: u32) -> DatabaseResult<Self> {
        let mut delay = Duration::from_millis(500);
        let mut last_error = String::new();
        for attempt in 1..=attempts.max(1) {
            match Self::open(path) {
                Ok(db) => return Ok(db),
                Err(err) => {
                    warn!("open attempt {attempt}/{attempts} failed: {err}");
                    last_error = err.to_string();
                }
            }
            if attempt < attempts {
                std::thread::sleep(delay);
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
        Err(DatabaseError::Connection(format!(
            "could not open {path:?} after {attempts} attempts: {last_error}"
        )))
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Persist one run and its party in a single transaction.
    ///
    /// Returns what happened to the run row. Party rows are only written
    /// when the run row was inserted or updated, and duplicates within a
    /// run are silently dropped by the uniqueness guard.
    pub fn insert_run_with_party(&mut self, run: &Run, policy: ConflictPolicy) -> DatabaseResult<UpsertOutcome> {
        let tx = self.conn.transaction()?;
        let outcome = upsert_run(&tx, run, policy)?;
        if let Some(run_id) = outcome.run_id() {
            insert_party(&tx, run_id, &run.party)?;
        }
        tx.commit()?;
        Ok(outcome)
    }

    pub fn count_runs(&self) -> DatabaseResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_party_rows(&self) -> DatabaseResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM party", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Distinct recording characters, alphabetical.
    pub fn characters(&self) -> DatabaseResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT character FROM runs ORDER BY character")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Every stored run, oldest first.
    pub fn all_runs(&self) -> DatabaseResult<Vec<RunRecord>> {
        self.query_records(
            "SELECT id, character, key_level, map_name, start_time, completion_time, completion_ms
             FROM runs ORDER BY start_time",
            params![],
        )
    }

    /// All runs recorded by one character, oldest first.
    pub fn runs_for_character(&self, character: &str) -> DatabaseResult<Vec<RunRecord>> {
        self.query_records(
            "SELECT id, character, key_level, map_name, start_time, completion_time, completion_ms
             FROM runs WHERE character = ?1 ORDER BY start_time",
            params![character],
        )
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> DatabaseResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, character, key_level, map_name, start, completion, completion_ms)| {
                let started_at = timestamp_from_str(&start).ok_or_else(|| {
                    DatabaseError::InvalidData(format!("run {id} has bad start_time `{start}`"))
                })?;
                let completed_at = match completion {
                    Some(s) => Some(timestamp_from_str(&s).ok_or_else(|| {
                        DatabaseError::InvalidData(format!(
                            "run {id} has bad completion_time `{s}`"
                        ))
                    })?),
                    None => None,
                };
                Ok(RunRecord {
                    id,
                    character,
                    key_level,
                    map_name,
                    started_at,
                    completed_at,
                    completion_ms,
                })
            })
            .collect()
    }

    /// Party rows for one run, in insertion order.
    pub fn party_for_run(&self, run_id: &str) -> DatabaseResult<Vec<PartyMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT role, name, class, spec FROM party WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let members = stmt
            .query_map(params![run_id], |row| {
                Ok(PartyMember {
                    role: Role::from_str(&row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    class: row.get(2)?,
                    spec: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }
}

/// Insert the run row, or resolve the `(character, start_time)` collision
/// per the given policy.
pub fn upsert_run(
    conn: &Connection,
    run: &Run,
    policy: ConflictPolicy,
) -> DatabaseResult<UpsertOutcome> {
    let start_time = format_timestamp(&run.started_at);
    let completion_time = run.completed_at.as_ref().map(format_timestamp);
    let affix_names = serde_json::to_string(&run.affixes)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM runs WHERE character = ?1 AND start_time = ?2",
            params![run.character, start_time],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    match existing {
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO runs (
                    id, character, season, completion_ms, affix_names, key_level,
                    map_name, start_time, completion_time, completed, on_time,
                    upgrade_levels, score_before, score_after, deaths, time_lost_ms
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    id,
                    run.character,
                    run.season,
                    run.completion_ms,
                    affix_names,
                    run.key_level,
                    run.map_name,
                    start_time,
                    completion_time,
                    run.completed,
                    run.on_time,
                    run.upgrade_levels,
                    run.score_before,
                    run.score_after,
                    run.deaths,
                    run.time_lost_ms,
                ],
            )?;
            Ok(UpsertOutcome::Inserted(id))
        }
        Some(id) => match policy {
            ConflictPolicy::Skip => {
                debug!(
                    character = %run.character,
                    start_time = %start_time,
                    "run already stored, skipping"
                );
                Ok(UpsertOutcome::Skipped)
            }
            ConflictPolicy::Update => {
                conn.execute(
                    "UPDATE runs SET
                        season = ?2, completion_ms = ?3, affix_names = ?4,
                        key_level = ?5, map_name = ?6, completion_time = ?7,
                        completed = ?8, on_time = ?9, upgrade_levels = ?10,
                        score_before = ?11, score_after = ?12, deaths = ?13,
                        time_lost_ms = ?14
                     WHERE id = ?1",
                    params![
                        id,
                        run.season,
                        run.completion_ms,
                        affix_names,
                        run.key_level,
                        run.map_name,
                        completion_time,
                        run.completed,
                        run.on_time,
                        run.upgrade_levels,
                        run.score_before,
                        run.score_after,
                        run.deaths,
                        run.time_lost_ms,
                    ],
                )?;
                Ok(UpsertOutcome::Updated(id))
            }
        },
    }
}

/// Insert party rows for a run. Rows colliding with the `(run_id, role,
/// name)` guard are dropped. Returns the number of rows actually written.
pub fn insert_party(
    conn: &Connection,
    run_id: &str,
    members: &[PartyMember],
) -> DatabaseResult<usize> {
    let mut inserted = 0;
    for member in members {
        let id = Uuid::new_v4().to_string();
        inserted += conn.execute(
            "INSERT OR IGNORE INTO party (id, run_id, role, name, class, spec)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                run_id,
                member.role.as_str(),
                member.name,
                member.class,
                member.spec,
            ],
        )?;
    }
    Ok(inserted)
}
