//! Database schema migrations.
//!
//! Each migration runs at most once; applied versions are recorded in the
//! `migrations` table so reopening an existing database is a no-op.

use rusqlite::Connection;
use tracing::info;

use crate::error::DatabaseResult;

/// Current schema version.
pub const CURRENT_VERSION: i64 = 2;

/// Run all pending migrations on the given connection.
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let applied = applied_version(conn)?;
    if applied >= CURRENT_VERSION {
        return Ok(());
    }

    if applied < 1 {
        migrate_v1_initial_schema(conn)?;
        record_migration(conn, 1)?;
        info!("applied migration v1: initial schema");
    }
    if applied < 2 {
        migrate_v2_party_unique_guard(conn)?;
        record_migration(conn, 2)?;
        info!("applied migration v2: party uniqueness guard");
    }

    Ok(())
}

fn applied_version(conn: &Connection) -> DatabaseResult<i64> {
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn record_migration(conn: &Connection, version: i64) -> DatabaseResult<()> {
    conn.execute("INSERT INTO migrations (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: runs and party tables.
///
/// A run is unique per recording character and start timestamp; party rows
/// cascade with their run.
fn migrate_v1_initial_schema(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS runs (
            id TEXT PRIMARY KEY,
            character TEXT NOT NULL,
            season INTEGER NOT NULL DEFAULT 1,
            completion_ms INTEGER,
            affix_names TEXT NOT NULL DEFAULT '[]',
            key_level INTEGER NOT NULL DEFAULT 0,
            map_name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            completion_time TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            on_time INTEGER,
            upgrade_levels INTEGER NOT NULL DEFAULT 0,
            score_before INTEGER NOT NULL DEFAULT 0,
            score_after INTEGER NOT NULL DEFAULT 0,
            deaths INTEGER NOT NULL DEFAULT 0,
            time_lost_ms INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(character, start_time)
        );

        CREATE INDEX IF NOT EXISTS idx_runs_character ON runs(character);
        CREATE INDEX IF NOT EXISTS idx_runs_start_time ON runs(start_time);

        CREATE TABLE IF NOT EXISTS party (
            id TEXT PRIMARY KEY,
            run_id TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            name TEXT NOT NULL,
            class TEXT NOT NULL,
            spec TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_party_run_id ON party(run_id);",
    )?;
    Ok(())
}

/// v2: one party row per (run, role, name).
///
/// Re-syncing an already-stored run under the update policy re-inserts its
/// party; this index turns those re-inserts into no-ops.
fn migrate_v2_party_unique_guard(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_party_member
            ON party(run_id, role, name);",
    )?;
    Ok(())
}
