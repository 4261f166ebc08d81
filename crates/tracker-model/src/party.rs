//! Party member types.

use serde::{Deserialize, Serialize};

/// One participant in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    pub role: Role,
    pub name: String,
    pub class: String,
    pub spec: Option<String>,
}

/// Combat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Tank,
    Healer,
    Damager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tank => "TANK",
            Self::Healer => "HEALER",
            Self::Damager => "DAMAGER",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "TANK" => Self::Tank,
            "HEALER" | "HEAL" => Self::Healer,
            // "DAMAGER", "DPS" and anything unrecognized.
            _ => Self::Damager,
        }
    }
}

/// Playable class archetypes, as the game reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CharacterClass {
    DeathKnight,
    DemonHunter,
    Druid,
    Evoker,
    Hunter,
    Mage,
    Monk,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
    Unknown,
}

impl CharacterClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeathKnight => "DEATHKNIGHT",
            Self::DemonHunter => "DEMONHUNTER",
            Self::Druid => "DRUID",
            Self::Evoker => "EVOKER",
            Self::Hunter => "HUNTER",
            Self::Mage => "MAGE",
            Self::Monk => "MONK",
            Self::Paladin => "PALADIN",
            Self::Priest => "PRIEST",
            Self::Rogue => "ROGUE",
            Self::Shaman => "SHAMAN",
            Self::Warlock => "WARLOCK",
            Self::Warrior => "WARRIOR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Accepts both the token form ("DEATHKNIGHT") and the display form
    /// ("Death Knight") the addon recorded in different versions.
    pub fn from_token(s: &str) -> Self {
        let token: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        match token.as_str() {
            "DEATHKNIGHT" => Self::DeathKnight,
            "DEMONHUNTER" => Self::DemonHunter,
            "DRUID" => Self::Druid,
            "EVOKER" => Self::Evoker,
            "HUNTER" => Self::Hunter,
            "MAGE" => Self::Mage,
            "MONK" => Self::Monk,
            "PALADIN" => Self::Paladin,
            "PRIEST" => Self::Priest,
            "ROGUE" => Self::Rogue,
            "SHAMAN" => Self::Shaman,
            "WARLOCK" => Self::Warlock,
            "WARRIOR" => Self::Warrior,
            _ => Self::Unknown,
        }
    }
}
