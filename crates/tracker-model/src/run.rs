//! Run entities.

use crate::PartyMember;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One completed (or attempted) timed dungeon run, fully normalized.
///
/// `(character, started_at)` is the uniqueness key: re-processing the same
/// run must never create a second row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Owning character name ("Unknown" when it could not be inferred).
    pub character: String,
    pub season: i64,
    /// Completion duration in milliseconds; None for abandoned runs.
    pub completion_ms: Option<i64>,
    /// Active affix names, in order.
    pub affixes: Vec<String>,
    pub key_level: i64,
    pub map_name: String,
    pub started_at: NaiveDateTime,
    /// Provided by the addon or derived from `started_at + completion_ms`.
    pub completed_at: Option<NaiveDateTime>,
    pub completed: bool,
    pub on_time: Option<bool>,
    pub upgrade_levels: i64,
    pub score_before: i64,
    pub score_after: i64,
    pub deaths: i64,
    /// Time lost to deaths, milliseconds.
    pub time_lost_ms: i64,
    pub party: Vec<PartyMember>,
}

/// A run row as read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: String,
    pub character: String,
    pub key_level: i64,
    pub map_name: String,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub completion_ms: Option<i64>,
}
