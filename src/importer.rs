use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::coerce::{as_float, as_int, as_name, norm_pos, pct01};
use crate::columns::{ColumnMap, Field};
use crate::db;
use crate::model::{NewPlayer, PlayerStats};
use crate::sheet::{self, Cell, RawSheet, Table};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Delete every existing player before importing.
    pub reset: bool,
    /// Record the detected header row and columns per sheet.
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub sheet: String,
    pub team_id: i64,
    pub team_name: String,
    pub header_row: usize,
    pub columns: Vec<String>,
    pub created: usize,
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: i64,
    pub reset: bool,
    pub players_deleted: usize,
    pub sheets: Vec<SheetReport>,
    pub total_created: usize,
}

/// State for one import run: the open transaction plus running counters.
/// Dropping the session without `finish` rolls everything back.
pub struct ImportSession<'conn> {
    tx: Transaction<'conn>,
    options: ImportOptions,
    source: String,
    started_at: String,
    players_deleted: usize,
    sheets: Vec<SheetReport>,
    total_created: usize,
}

impl<'conn> ImportSession<'conn> {
    pub fn begin(conn: &'conn mut Connection, source: &str, options: ImportOptions) -> Result<Self> {
        let tx = conn.transaction().context("begin import transaction")?;
        let mut players_deleted = 0;
        if options.reset {
            warn!("deleting all existing players before import");
            players_deleted = db::delete_all_players(&tx)?;
        }
        Ok(Self {
            tx,
            options,
            source: source.to_string(),
            started_at: Utc::now().to_rfc3339(),
            players_deleted,
            sheets: Vec::new(),
            total_created: 0,
        })
    }

    pub fn total_created(&self) -> usize {
        self.total_created
    }

    pub fn import_sheet(&mut self, raw: &RawSheet) -> Result<&SheetReport> {
        let header_row = sheet::find_header_row(raw);
        let table = sheet::apply_header(raw, header_row);

        if self.options.debug {
            info!(
                sheet = %raw.name,
                header_row,
                columns = ?table.columns,
                "detected sheet layout"
            );
        }

        let (team, created_team) = db::get_or_create_team(&self.tx, raw.name.trim())?;
        if created_team {
            debug!(team = %team.name, team_id = team.id, "created team");
        }

        let mut report = SheetReport {
            sheet: raw.name.clone(),
            team_id: team.id,
            team_name: team.name.clone(),
            header_row,
            columns: table.columns.clone(),
            created: 0,
            skipped: None,
        };

        if !table.has_name_column() {
            warn!(team = %team.name, "skipped: no 'Player/Players/Name' column found");
            report.skipped = Some("no 'Player/Players/Name' column found".to_string());
            self.sheets.push(report);
            return Ok(self.last_report());
        }

        let columns = ColumnMap::resolve(&table.columns);
        for row in named_rows(&table, &columns) {
            let Some(player) = extract_player(row, &columns) else {
                continue;
            };
            db::insert_player(&self.tx, team.id, &player)?;
            report.created += 1;
            self.total_created += 1;
        }

        info!(team = %team.name, created = report.created, "imported players");
        self.sheets.push(report);
        Ok(self.last_report())
    }

    /// Records the run and commits every sheet at once.
    pub fn finish(self) -> Result<ImportReport> {
        let sheets_imported = self.sheets.iter().filter(|s| s.skipped.is_none()).count();
        self.tx
            .execute(
                "INSERT INTO import_runs(started_at, finished_at, source_path, reset, sheets_total, sheets_imported, players_created)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    self.started_at,
                    Utc::now().to_rfc3339(),
                    self.source,
                    i64::from(self.options.reset),
                    self.sheets.len() as i64,
                    sheets_imported as i64,
                    self.total_created as i64,
                ],
            )
            .context("insert import run")?;
        let run_id = self.tx.last_insert_rowid();
        self.tx.commit().context("commit import transaction")?;

        info!(total = self.total_created, "import complete");
        Ok(ImportReport {
            run_id,
            reset: self.options.reset,
            players_deleted: self.players_deleted,
            sheets: self.sheets,
            total_created: self.total_created,
        })
    }

    fn last_report(&self) -> &SheetReport {
        &self.sheets[self.sheets.len() - 1]
    }
}

/// Imports every sheet of the workbook at `path` in one transaction.
pub fn import_workbook(
    conn: &mut Connection,
    path: &Path,
    options: ImportOptions,
) -> Result<ImportReport> {
    let sheets = sheet::read_workbook(path)?;
    import_sheets(conn, &path.display().to_string(), &sheets, options)
}

pub fn import_sheets(
    conn: &mut Connection,
    source: &str,
    sheets: &[RawSheet],
    options: ImportOptions,
) -> Result<ImportReport> {
    let mut session = ImportSession::begin(conn, source, options)?;
    for raw in sheets {
        session
            .import_sheet(raw)
            .with_context(|| format!("import sheet '{}'", raw.name))?;
    }
    session.finish()
}

/// Data rows whose name cell is filled in.
fn named_rows<'t>(table: &'t Table, columns: &ColumnMap) -> impl Iterator<Item = &'t [Cell]> {
    let name_idx = columns.get(Field::Name);
    table.rows.iter().filter_map(move |row| {
        let idx = name_idx?;
        let filled = row.get(idx).is_some_and(|cell| !cell.is_blank());
        filled.then_some(row.as_slice())
    })
}

/// Builds a player from one data row; `None` when the name is unusable.
pub fn extract_player(row: &[Cell], columns: &ColumnMap) -> Option<NewPlayer> {
    let cell = |field: Field| columns.get(field).and_then(|idx| row.get(idx));
    let name = as_name(cell(Field::Name))?;

    let number = u32::try_from(as_int(cell(Field::Number), 0).max(0)).unwrap_or(u32::MAX);
    Some(NewPlayer {
        name,
        number,
        position: norm_pos(cell(Field::Position)),
        stats: PlayerStats {
            games: Some(as_int(cell(Field::Games), 0)),
            minutes_per_game: Some(as_float(cell(Field::Minutes), 0.0)),
            points_per_game: Some(as_float(cell(Field::Points), 0.0)),
            rebounds_per_game: Some(as_float(cell(Field::Rebounds), 0.0)),
            assists_per_game: Some(as_float(cell(Field::Assists), 0.0)),
            steals_per_game: Some(as_float(cell(Field::Steals), 0.0)),
            blocks_per_game: Some(as_float(cell(Field::Blocks), 0.0)),
            fouls_per_game: Some(as_float(cell(Field::Fouls), 0.0)),
            turnovers_per_game: Some(as_float(cell(Field::Turnovers), 0.0)),
            two_points_pct: Some(pct01(cell(Field::TwoPointPct))),
            three_points_pct: Some(pct01(cell(Field::ThreePointPct))),
            rating: Some(as_float(cell(Field::Rating), 0.0)),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extract_player_applies_defaults() {
        let columns = ColumnMap::resolve(&header(&["Player", "No", "Pos", "PTS", "3PT%"]));
        let row = vec![
            Cell::text(" Steph "),
            Cell::text("-4"),
            Cell::text("guard"),
            Cell::text("29,4"),
            Cell::Int(43),
        ];
        let p = extract_player(&row, &columns).unwrap();
        assert_eq!(p.name, "Steph");
        assert_eq!(p.number, 0);
        assert_eq!(p.position, Position::Guard);
        assert_eq!(p.stats.points_per_game, Some(29.4));
        assert_eq!(p.stats.rebounds_per_game, Some(0.0));
        assert_eq!(p.stats.games, Some(0));
        assert!((p.stats.three_points_pct.unwrap() - 0.43).abs() < 1e-12);
        assert_eq!(p.stats.two_points_pct, Some(0.0));
    }

    #[test]
    fn extract_player_skips_blank_names() {
        let columns = ColumnMap::resolve(&header(&["Name", "PTS"]));
        assert!(extract_player(&[Cell::text("  "), Cell::Float(3.0)], &columns).is_none());
        assert!(extract_player(&[], &columns).is_none());
    }

    #[test]
    fn dropped_session_rolls_back() {
        let mut conn = db::open_in_memory().unwrap();
        {
            let mut session =
                ImportSession::begin(&mut conn, "memory", ImportOptions::default()).unwrap();
            let sheet = RawSheet::new(
                "Suns",
                vec![
                    vec![Cell::text("Player")],
                    vec![Cell::text("Booker")],
                ],
            );
            session.import_sheet(&sheet).unwrap();
            assert_eq!(session.total_created(), 1);
        }
        assert_eq!(db::count_players(&conn).unwrap(), 0);
        assert!(db::list_teams(&conn).unwrap().is_empty());
    }
}
