use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::info;

use crate::columns::Field;
use crate::db;
use crate::model::Player;

const SHEET_NAME_MAX: usize = 31;

/// Export column order; headers are the ones the importer recognises first.
const EXPORT_FIELDS: &[Field] = &[
    Field::Name,
    Field::Number,
    Field::Position,
    Field::Games,
    Field::Minutes,
    Field::Points,
    Field::Rebounds,
    Field::Assists,
    Field::Steals,
    Field::Blocks,
    Field::Fouls,
    Field::Turnovers,
    Field::TwoPointPct,
    Field::ThreePointPct,
    Field::Rating,
];

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub teams: usize,
    pub players: usize,
    /// (team name, worksheet name) for every team written.
    pub sheets: Vec<(String, String)>,
}

/// Writes one worksheet per team, in the layout `import_workbook` reads back.
pub fn export_workbook(conn: &Connection, path: &Path) -> Result<ExportReport> {
    let teams = db::list_teams(conn)?;
    let mut workbook = Workbook::new();
    let mut used = HashSet::new();
    let mut sheets = Vec::new();
    let mut players_total = 0usize;

    for team in &teams {
        let players = db::players_for_team(conn, team.id)?;
        let sheet_name = unique_sheet_name(&team.name, team.id, &mut used);
        {
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(&sheet_name)
                .with_context(|| format!("name worksheet '{sheet_name}'"))?;
            write_roster(sheet, &players)?;
        }
        players_total += players.len();
        sheets.push((team.name.clone(), sheet_name));
    }
    if teams.is_empty() {
        workbook.add_worksheet();
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(teams = teams.len(), players = players_total, path = %path.display(), "export complete");

    Ok(ExportReport {
        teams: teams.len(),
        players: players_total,
        sheets,
    })
}

fn write_roster(sheet: &mut Worksheet, players: &[Player]) -> Result<()> {
    for (col, field) in EXPORT_FIELDS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, field.canonical_header())
            .with_context(|| format!("write header ({col})"))?;
    }
    for (idx, player) in players.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, field) in EXPORT_FIELDS.iter().enumerate() {
            let col = col as u16;
            let written = match field_value(player, *field) {
                CellOut::Text(text) => sheet.write_string(row, col, text),
                CellOut::Number(n) => sheet.write_number(row, col, n),
                CellOut::Blank => continue,
            };
            written.with_context(|| format!("write cell ({row},{col})"))?;
        }
    }
    Ok(())
}

enum CellOut {
    Text(String),
    Number(f64),
    Blank,
}

fn field_value(p: &Player, field: Field) -> CellOut {
    let s = &p.stats;
    let number = |v: Option<f64>| v.map(CellOut::Number).unwrap_or(CellOut::Blank);
    match field {
        Field::Name => CellOut::Text(p.name.clone()),
        Field::Number => CellOut::Number(f64::from(p.number)),
        Field::Position => CellOut::Text(p.position.label().to_string()),
        Field::Games => number(s.games.map(|g| g as f64)),
        Field::Minutes => number(s.minutes_per_game),
        Field::Points => number(s.points_per_game),
        Field::Rebounds => number(s.rebounds_per_game),
        Field::Assists => number(s.assists_per_game),
        Field::Steals => number(s.steals_per_game),
        Field::Blocks => number(s.blocks_per_game),
        Field::Fouls => number(s.fouls_per_game),
        Field::Turnovers => number(s.turnovers_per_game),
        Field::TwoPointPct => number(s.two_points_pct),
        Field::ThreePointPct => number(s.three_points_pct),
        Field::Rating => number(s.rating),
    }
}

/// Excel-safe worksheet name, unique (case-insensitively) within the workbook.
pub fn unique_sheet_name(team_name: &str, team_id: i64, used: &mut HashSet<String>) -> String {
    let cleaned = team_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect::<String>();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base = if cleaned.is_empty() {
        format!("Team {team_id}")
    } else {
        truncate_chars(cleaned, SHEET_NAME_MAX)
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = SHEET_NAME_MAX.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", truncate_chars(&base, keep).trim_end());
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_sanitized_and_unique() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("Lakers", 1, &mut used), "Lakers");
        assert_eq!(unique_sheet_name("lakers", 2, &mut used), "lakers (2)");
        assert_eq!(unique_sheet_name("A/B: Team?", 3, &mut used), "A_B_ Team_");
        assert_eq!(unique_sheet_name("  ", 4, &mut used), "Team 4");
    }

    #[test]
    fn long_names_fit_excel_limit() {
        let mut used = HashSet::new();
        let long = "The Extremely Long Basketball Club Name";
        let first = unique_sheet_name(long, 1, &mut used);
        let second = unique_sheet_name(long, 2, &mut used);
        assert_eq!(first.chars().count(), SHEET_NAME_MAX);
        assert!(second.chars().count() <= SHEET_NAME_MAX);
        assert!(second.ends_with(" (2)"));
    }
}
