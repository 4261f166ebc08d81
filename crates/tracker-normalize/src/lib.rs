//! Run normalization: one decoded run map in, one canonical [`Run`] out.
//!
//! The addon's table layout drifted across versions. Rather than branch on
//! a version flag, every canonical field resolves through an explicit
//! alias table (see `fields.rs`) chosen by which optional fields are
//! actually present. The transform is pure: all I/O lives in the sync and
//! storage layers.

mod fields;
mod party;

use chrono::Duration;
use fields as f;
use fields::Fields;
use party::extract_party;
use thiserror::Error;
use tracker_model::Run;
use tracker_savedvars::LuaValue;

/// Normalization failure for a single run record.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The decoded entry is not a key-value table at all.
    #[error("run entry is not a table (got {0})")]
    NotATable(&'static str),

    /// A required field is absent or unusable.
    #[error("run is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Result type alias using NormalizeError.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Character name used when no explicit field and no `*`-marked party
/// member is present.
pub const UNKNOWN_CHARACTER: &str = "Unknown";

/// Normalize one decoded run map into the canonical model.
///
/// Required fields: start timestamp and map name. Everything else falls
/// back per the field-resolution policy (numeric fields default to 0,
/// season to 1, affixes to a single empty string).
pub fn normalize_run(value: &LuaValue) -> NormalizeResult<Run> {
    if value.as_map().is_none() {
        return Err(NormalizeError::NotATable(value.type_name()));
    }
    let fields = Fields::new(value);

    let started_at = fields
        .timestamp_field(f::START_TIME)
        .ok_or(NormalizeError::MissingField("startTime"))?;
    let map_name = fields
        .str_field(f::MAP_NAME)
        .ok_or(NormalizeError::MissingField("mapName"))?
        .to_string();

    let extracted = extract_party(fields.first(f::PARTY));

    let character = fields
        .str_field(f::CHARACTER)
        .map(str::to_string)
        .or(extracted.marked_self)
        .unwrap_or_else(|| UNKNOWN_CHARACTER.to_string());

    let completion_ms = fields.int_field(f::COMPLETION_MS);
    let completed_at = fields.timestamp_field(f::COMPLETED_AT).or_else(|| {
        completion_ms.map(|ms| started_at + Duration::seconds(ms / 1000))
    });

    Ok(Run {
        character,
        season: fields.int_field(f::SEASON).unwrap_or(1),
        completion_ms,
        affixes: fields.affixes(),
        key_level: fields.int_field(f::KEY_LEVEL).unwrap_or(0),
        map_name,
        started_at,
        completed_at,
        completed: fields.bool_field(f::COMPLETED).unwrap_or(false),
        on_time: fields.bool_field(f::ON_TIME),
        upgrade_levels: fields.int_field(f::UPGRADES).unwrap_or(0),
        score_before: fields.int_field(f::SCORE_BEFORE).unwrap_or(0),
        score_after: fields.int_field(f::SCORE_AFTER).unwrap_or(0),
        deaths: fields.int_field(f::DEATHS).unwrap_or(0),
        time_lost_ms: fields.int_field(f::TIME_LOST).unwrap_or(0),
        party: extracted.members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_model::{format_timestamp, Role};
    use tracker_savedvars::parse_value;

    fn run_from(src: &str) -> Run {
        normalize_run(&parse_value(src).unwrap()).unwrap()
    }

    #[test]
    fn modern_layout_normalizes() {
        let run = run_from(
            r#"{
                ["character"] = "Drwn",
                ["season"] = 2,
                ["level"] = 12,
                ["mapName"] = "The Dawnbreaker",
                ["startTime"] = "2024-01-01 00:00:00",
                ["completionTime"] = 1634000,
                ["affixNames"] = { "Tyrannical", "Bolstering" },
                ["completed"] = true,
                ["onTime"] = true,
                ["upgrades"] = 2,
                ["scoreBefore"] = 2410,
                ["scoreAfter"] = 2450,
                ["deaths"] = 3,
                ["timeLost"] = 15000,
                ["party"] = {
                    { ["role"] = "TANK", ["name"] = "Pallytank", ["class"] = "PALADIN" },
                },
            }"#,
        );
        assert_eq!(run.character, "Drwn");
        assert_eq!(run.season, 2);
        assert_eq!(run.key_level, 12);
        assert_eq!(run.affixes, vec!["Tyrannical", "Bolstering"]);
        assert_eq!(run.deaths, 3);
        assert_eq!(run.on_time, Some(true));
        assert_eq!(run.party.len(), 1);
    }

    #[test]
    fn legacy_layout_resolves_through_aliases() {
        let run = run_from(
            r#"{
                ["keyLvl"] = 15,
                ["map"] = "Grim Batol",
                ["startTime"] = 1704067200,
                ["affixes"] = { "Fortified" },
                ["group"] = {
                    { ["role"] = "HEALER", ["name"] = "Treelord", ["class"] = "DRUID" },
                },
            }"#,
        );
        assert_eq!(run.key_level, 15);
        assert_eq!(run.map_name, "Grim Batol");
        assert_eq!(format_timestamp(&run.started_at), "2024-01-01 00:00:00");
        assert_eq!(run.affixes, vec!["Fortified"]);
        assert_eq!(run.party.len(), 1);
    }

    #[test]
    fn character_falls_back_to_marked_party_member() {
        let run = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["party"] = {
                    { ["role"] = "TANK", ["name"] = "Bigbear", ["class"] = "DRUID" },
                    { ["role"] = "DAMAGER", ["name"] = "Foo*", ["class"] = "MAGE" },
                },
            }"#,
        );
        assert_eq!(run.character, "Foo");
        // Marker stripped from the stored member too.
        assert_eq!(run.party[1].name, "Foo");
    }

    #[test]
    fn character_falls_back_to_unknown() {
        let run = run_from(
            r#"{ ["mapName"] = "Ara-Kara", ["startTime"] = "2024-01-01 00:00:00" }"#,
        );
        assert_eq!(run.character, UNKNOWN_CHARACTER);
    }

    #[test]
    fn explicit_character_beats_marker() {
        let run = run_from(
            r#"{
                ["character"] = "Podcast",
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["party"] = { { ["name"] = "Foo*", ["class"] = "MAGE" } },
            }"#,
        );
        assert_eq!(run.character, "Podcast");
    }

    #[test]
    fn completion_timestamp_derived_from_duration() {
        let run = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["completionTime"] = 125000,
            }"#,
        );
        let completed_at = run.completed_at.unwrap();
        assert_eq!(format_timestamp(&completed_at), "2024-01-01 00:02:05");
    }

    #[test]
    fn completion_timestamp_null_without_duration() {
        let run = run_from(
            r#"{ ["mapName"] = "Ara-Kara", ["startTime"] = "2024-01-01 00:00:00" }"#,
        );
        assert_eq!(run.completion_ms, None);
        assert_eq!(run.completed_at, None);
    }

    #[test]
    fn explicit_completion_timestamp_wins() {
        let run = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["completedAt"] = "2024-01-01 00:30:00",
                ["completionTime"] = 125000,
            }"#,
        );
        assert_eq!(
            format_timestamp(&run.completed_at.unwrap()),
            "2024-01-01 00:30:00"
        );
    }

    #[test]
    fn party_shapes_are_equivalent() {
        let flat = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["party"] = {
                    { ["role"] = "TANK", ["name"] = "Pallytank", ["class"] = "PALADIN" },
                    { ["role"] = "HEALER", ["name"] = "Treelord", ["class"] = "DRUID" },
                },
            }"#,
        );
        let structured = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["party"] = {
                    ["tank"] = { ["name"] = "Pallytank", ["class"] = "PALADIN" },
                    ["healer"] = { ["name"] = "Treelord", ["class"] = "DRUID" },
                },
            }"#,
        );
        assert_eq!(flat.party, structured.party);
        assert_eq!(flat.party[0].role, Role::Tank);
    }

    #[test]
    fn defaults_for_absent_fields() {
        let run = run_from(
            r#"{ ["mapName"] = "Ara-Kara", ["startTime"] = "2024-01-01 00:00:00" }"#,
        );
        assert_eq!(run.season, 1);
        assert_eq!(run.key_level, 0);
        assert_eq!(run.deaths, 0);
        assert_eq!(run.time_lost_ms, 0);
        assert_eq!(run.upgrade_levels, 0);
        assert_eq!(run.score_before, 0);
        assert_eq!(run.score_after, 0);
        assert!(!run.completed);
        assert_eq!(run.on_time, None);
        assert_eq!(run.affixes, vec![String::new()]);
        assert!(run.party.is_empty());
    }

    #[test]
    fn legacy_scalar_affix_is_wrapped() {
        let run = run_from(
            r#"{
                ["mapName"] = "Ara-Kara",
                ["startTime"] = "2024-01-01 00:00:00",
                ["affix"] = "Tyrannical",
            }"#,
        );
        assert_eq!(run.affixes, vec!["Tyrannical"]);
    }

    #[test]
    fn missing_map_name_is_an_error() {
        let err =
            normalize_run(&parse_value(r#"{ ["startTime"] = "2024-01-01 00:00:00" }"#).unwrap())
                .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("mapName")));
    }

    #[test]
    fn missing_start_time_is_an_error() {
        let err = normalize_run(&parse_value(r#"{ ["mapName"] = "Ara-Kara" }"#).unwrap())
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("startTime")));
    }

    #[test]
    fn non_table_entry_is_an_error() {
        let err = normalize_run(&parse_value("42").unwrap()).unwrap_err();
        assert!(matches!(err, NormalizeError::NotATable("number")));
    }
}
