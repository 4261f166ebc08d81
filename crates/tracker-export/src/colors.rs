//! In-game class colors, as hex RGB.

use rust_xlsxwriter::Color;
use tracker_model::CharacterClass;

/// Spreadsheet fill color for a class token. Unknown classes fall back
/// to white.
pub fn class_color(class: &str) -> Color {
    match CharacterClass::from_token(class) {
        CharacterClass::DeathKnight => Color::RGB(0xC41E3A),
        CharacterClass::DemonHunter => Color::RGB(0xA330C9),
        CharacterClass::Druid => Color::RGB(0xFF7C0A),
        CharacterClass::Evoker => Color::RGB(0x33937F),
        CharacterClass::Hunter => Color::RGB(0xAAD372),
        CharacterClass::Mage => Color::RGB(0x3FC7EB),
        CharacterClass::Monk => Color::RGB(0x00FF98),
        CharacterClass::Paladin => Color::RGB(0xF48CBA),
        CharacterClass::Priest => Color::RGB(0xFFFFFF),
        CharacterClass::Rogue => Color::RGB(0xFFF468),
        CharacterClass::Shaman => Color::RGB(0x0070DD),
        CharacterClass::Warlock => Color::RGB(0x8788EE),
        CharacterClass::Warrior => Color::RGB(0xC69B6D),
        CharacterClass::Unknown => Color::RGB(0xFFFFFF),
    }
}
