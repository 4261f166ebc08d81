//! Field resolution over inconsistently-named run maps.
//!
//! Addon versions renamed fields several times (`level` vs `keyLvl`,
//! `affixNames` vs `affixes`, `party` vs `group`). Each canonical field
//! resolves through an explicit alias list, first present non-nil entry
//! wins, evaluated once per run before any persistence logic.

use chrono::NaiveDateTime;
use tracker_model::{timestamp_from_epoch, timestamp_from_str};
use tracker_savedvars::LuaValue;

pub(crate) const CHARACTER: &[&str] = &["character", "char"];
pub(crate) const SEASON: &[&str] = &["season"];
pub(crate) const KEY_LEVEL: &[&str] = &["level", "keyLvl"];
pub(crate) const MAP_NAME: &[&str] = &["mapName", "map"];
pub(crate) const START_TIME: &[&str] = &["startTime", "startedAt"];
pub(crate) const COMPLETION_MS: &[&str] = &["completionTime", "completionMS"];
pub(crate) const COMPLETED_AT: &[&str] = &["completedAt"];
pub(crate) const AFFIX_LIST: &[&str] = &["affixNames", "affixes"];
pub(crate) const AFFIX_LEGACY: &[&str] = &["affix"];
pub(crate) const PARTY: &[&str] = &["party", "group"];
pub(crate) const COMPLETED: &[&str] = &["completed", "isCompleted"];
pub(crate) const ON_TIME: &[&str] = &["onTime", "inTime"];
pub(crate) const UPGRADES: &[&str] = &["upgrades", "keystoneUpgrades"];
pub(crate) const SCORE_BEFORE: &[&str] = &["scoreBefore", "oldScore"];
pub(crate) const SCORE_AFTER: &[&str] = &["scoreAfter", "newScore"];
pub(crate) const DEATHS: &[&str] = &["deaths", "deathCount"];
pub(crate) const TIME_LOST: &[&str] = &["timeLost", "timeLostMS"];

/// Alias-resolving view over one decoded run map.
pub(crate) struct Fields<'a> {
    run: &'a LuaValue,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(run: &'a LuaValue) -> Self {
        Self { run }
    }

    /// First alias present with a non-nil value.
    pub(crate) fn first(&self, aliases: &[&str]) -> Option<&'a LuaValue> {
        aliases
            .iter()
            .filter_map(|alias| self.run.get(alias))
            .find(|v| !v.is_nil())
    }

    /// Non-empty string field.
    pub(crate) fn str_field(&self, aliases: &[&str]) -> Option<&'a str> {
        self.first(aliases)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub(crate) fn int_field(&self, aliases: &[&str]) -> Option<i64> {
        self.first(aliases).and_then(|v| v.as_i64())
    }

    /// Boolean field; older addon versions wrote 0/1 integers.
    pub(crate) fn bool_field(&self, aliases: &[&str]) -> Option<bool> {
        match self.first(aliases)? {
            LuaValue::Bool(b) => Some(*b),
            LuaValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Timestamp field: epoch seconds or a `YYYY-MM-DD HH:MM:SS` string.
    pub(crate) fn timestamp_field(&self, aliases: &[&str]) -> Option<NaiveDateTime> {
        match self.first(aliases)? {
            LuaValue::Int(secs) => timestamp_from_epoch(*secs),
            LuaValue::Float(secs) => timestamp_from_epoch(*secs as i64),
            LuaValue::Str(s) => timestamp_from_str(s),
            _ => None,
        }
    }

    /// Affix names: a list field, a legacy scalar wrapped into a
    /// one-element list, or the empty-string singleton.
    pub(crate) fn affixes(&self) -> Vec<String> {
        if let Some(value) = self.first(AFFIX_LIST) {
            match value {
                LuaValue::Seq(items) => {
                    return items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(str::to_string)
                        .collect();
                }
                LuaValue::Str(s) => return vec![s.clone()],
                _ => {}
            }
        }
        if let Some(single) = self.str_field(AFFIX_LEGACY) {
            return vec![single.to_string()];
        }
        vec![String::new()]
    }
}
