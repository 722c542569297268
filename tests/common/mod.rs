#![allow(dead_code)]

use std::path::Path;

use courtside::db;
use courtside::model::{NewPlayer, PlayerStats, Position};
use rusqlite::Connection;
use rust_xlsxwriter::Workbook;

#[derive(Debug, Clone, Copy)]
pub enum V<'a> {
    S(&'a str),
    N(f64),
    Blank,
}

/// Writes `sheets` to an xlsx file, each as (name, first row index, first column index, rows).
pub fn write_workbook_at(path: &Path, sheets: &[(&str, u32, u16, Vec<Vec<V<'_>>>)]) {
    let mut workbook = Workbook::new();
    for (name, row0, col0, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).expect("valid sheet name");
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (row0 + r as u32, col0 + c as u16);
                match value {
                    V::S(s) => {
                        sheet.write_string(r, c, *s).expect("write string");
                    }
                    V::N(n) => {
                        sheet.write_number(r, c, *n).expect("write number");
                    }
                    V::Blank => {}
                }
            }
        }
    }
    workbook.save(path).expect("save workbook");
}

pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<V<'_>>>)]) {
    let placed = sheets
        .iter()
        .map(|(name, rows)| (*name, 0, 0, rows.clone()))
        .collect::<Vec<_>>();
    write_workbook_at(path, &placed);
}

pub fn add_player(
    conn: &Connection,
    team_id: i64,
    name: &str,
    position: Position,
    stats: PlayerStats,
) -> i64 {
    db::insert_player(
        conn,
        team_id,
        &NewPlayer {
            name: name.to_string(),
            number: 0,
            position,
            stats,
        },
    )
    .expect("insert player")
}

pub fn stats(pts: f64, reb: f64, ast: f64, rating: f64) -> PlayerStats {
    PlayerStats {
        games: Some(10),
        minutes_per_game: Some(25.0),
        points_per_game: Some(pts),
        rebounds_per_game: Some(reb),
        assists_per_game: Some(ast),
        rating: Some(rating),
        ..PlayerStats::default()
    }
}
