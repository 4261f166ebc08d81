//! Workbook assembly: one sheet per tracked character.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info};

use tracker_database::Database;
use tracker_model::{format_timestamp, PartyMember, Role, RunRecord};

use crate::colors::class_color;
use crate::error::ExportResult;

const HEADER_FILL: u32 = 0xD9D9D9;
const MIN_COLUMN_WIDTH: f64 = 15.0;

/// Excel caps worksheet names at 31 characters.
fn sheet_name(character: &str) -> String {
    character.chars().take(31).collect()
}

/// `Name (Spec)`, falling back to the class token when the spec was not
/// recorded.
fn member_label(member: &PartyMember) -> String {
    let detail = member.spec.as_deref().unwrap_or(&member.class);
    format!("{} ({})", member.name, detail)
}

fn find_role<'a>(party: &'a [PartyMember], role: Role) -> Option<&'a PartyMember> {
    party.iter().find(|m| m.role == role)
}

fn damagers(party: &[PartyMember]) -> Vec<&PartyMember> {
    party.iter().filter(|m| m.role == Role::Damager).collect()
}

/// Export one worksheet per tracked character that appears in at least
/// one run's party. Returns the number of sheets written; zero sheets
/// still produces a valid (empty) workbook.
pub fn export_workbook(db: &Database, characters: &[String], path: &Path) -> ExportResult<usize> {
    let runs = db.all_runs()?;
    let mut parties = Vec::with_capacity(runs.len());
    for run in &runs {
        parties.push(db.party_for_run(&run.id)?);
    }

    let mut workbook = Workbook::new();
    let mut sheets = 0;

    let mut seen: Vec<&str> = Vec::new();
    for character in characters {
        if seen.contains(&character.as_str()) {
            continue;
        }
        seen.push(character);

        let rows: Vec<(&RunRecord, &[PartyMember])> = runs
            .iter()
            .zip(&parties)
            .filter(|(_, party)| party.iter().any(|m| &m.name == character))
            .map(|(run, party)| (run, party.as_slice()))
            .collect();
        if rows.is_empty() {
            debug!(character = %character, "no party appearances, no sheet");
            continue;
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(character))?;
        write_sheet(worksheet, &rows)?;
        sheets += 1;
    }

    workbook.save(path)?;
    info!(sheets, path = %path.display(), "workbook written");
    Ok(sheets)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    rows: &[(&RunRecord, &[PartyMember])],
) -> ExportResult<()> {
    let dps_columns = rows
        .iter()
        .map(|(_, party)| damagers(party).len())
        .max()
        .unwrap_or(0);

    let mut headers = vec![
        "Start Time".to_string(),
        "Level".to_string(),
        "Map Name".to_string(),
        "Tank".to_string(),
        "Healer".to_string(),
    ];
    for n in 1..=dps_columns {
        headers.push(format!("DPS{n}"));
    }
    headers.push("Completion Time".to_string());

    let header_format = Format::new()
        .set_bold()
        .set_background_color(HEADER_FILL)
        .set_font_size(16);
    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, header, &header_format)?;
        worksheet.set_column_width(col, (header.len() as f64).max(MIN_COLUMN_WIDTH))?;
    }

    for (row_idx, (run, party)) in rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, format_timestamp(&run.started_at))?;
        worksheet.write_number(row, 1, run.key_level as f64)?;
        worksheet.write_string(row, 2, &run.map_name)?;

        write_member(worksheet, row, 3, find_role(party, Role::Tank))?;
        write_member(worksheet, row, 4, find_role(party, Role::Healer))?;
        for (i, member) in damagers(party).into_iter().enumerate() {
            write_member(worksheet, row, 5 + i as u16, Some(member))?;
        }

        let completion_col = (5 + dps_columns) as u16;
        if let Some(ms) = run.completion_ms {
            worksheet.write_number(row, completion_col, ms as f64)?;
        }
    }
    Ok(())
}

fn write_member(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    member: Option<&PartyMember>,
) -> ExportResult<()> {
    let Some(member) = member else {
        return Ok(());
    };
    let format = Format::new().set_background_color(class_color(&member.class));
    worksheet.write_string_with_format(row, col, member_label(member), &format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracker_database::ConflictPolicy;
    use tracker_model::{timestamp_from_str, Run};

    fn member(role: Role, name: &str, class: &str, spec: Option<&str>) -> PartyMember {
        PartyMember {
            role,
            name: name.to_string(),
            class: class.to_string(),
            spec: spec.map(str::to_string),
        }
    }

    fn run_with_party(start: &str, party: Vec<PartyMember>) -> Run {
        Run {
            character: "Drwn".to_string(),
            season: 1,
            completion_ms: Some(1_634_000),
            affixes: vec!["Tyrannical".to_string()],
            key_level: 12,
            map_name: "The Dawnbreaker".to_string(),
            started_at: timestamp_from_str(start).unwrap(),
            completed_at: None,
            completed: true,
            on_time: Some(true),
            upgrade_levels: 1,
            score_before: 0,
            score_after: 0,
            deaths: 0,
            time_lost_ms: 0,
            party,
        }
    }

    #[test]
    fn sheet_name_truncates_to_31_chars() {
        let long = "A".repeat(40);
        assert_eq!(sheet_name(&long).len(), 31);
        assert_eq!(sheet_name("Drwn"), "Drwn");
    }

    #[test]
    fn member_label_prefers_spec() {
        let with_spec = member(Role::Tank, "Pallytank", "PALADIN", Some("Protection"));
        assert_eq!(member_label(&with_spec), "Pallytank (Protection)");
        let without = member(Role::Tank, "Pallytank", "PALADIN", None);
        assert_eq!(member_label(&without), "Pallytank (PALADIN)");
    }

    #[test]
    fn exports_one_sheet_per_appearing_character() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_run_with_party(
            &run_with_party(
                "2024-01-01 00:00:00",
                vec![
                    member(Role::Tank, "Pallytank", "PALADIN", None),
                    member(Role::Healer, "Treelord", "DRUID", None),
                    member(Role::Damager, "Drwn", "SHAMAN", Some("Enhancement")),
                    member(Role::Damager, "Podcast", "MAGE", None),
                ],
            ),
            ConflictPolicy::Skip,
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("runs.xlsx");
        let tracked = vec![
            "Drwn".to_string(),
            "Podcast".to_string(),
            "Samahan".to_string(),
        ];
        let sheets = export_workbook(&db, &tracked, &path).unwrap();

        // Samahan never appears in a party, so no third sheet.
        assert_eq!(sheets, 2);
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn duplicate_tracked_characters_collapse() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_run_with_party(
            &run_with_party(
                "2024-01-01 00:00:00",
                vec![member(Role::Damager, "Drwn", "SHAMAN", None)],
            ),
            ConflictPolicy::Skip,
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("runs.xlsx");
        let tracked = vec!["Drwn".to_string(), "Drwn".to_string()];
        assert_eq!(export_workbook(&db, &tracked, &path).unwrap(), 1);
    }

    #[test]
    fn empty_database_writes_empty_workbook() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs.xlsx");
        let sheets = export_workbook(&db, &["Drwn".to_string()], &path).unwrap();
        assert_eq!(sheets, 0);
        assert!(path.exists());
    }
}
