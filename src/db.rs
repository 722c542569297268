use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use crate::model::{NewPlayer, Player, PlayerStats, Position, Team};

/// Column list shared by every player SELECT, in `player_from_row` order.
pub(crate) const PLAYER_COLUMNS: &str = "id, team_id, name, number, position, games, \
     minutes_per_game, points_per_game, rebounds_per_game, assists_per_game, \
     steals_per_game, blocks_per_game, fouls_per_game, turnovers_per_game, \
     two_points_pct, three_points_pct, rating";

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            logo TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_teams_name ON teams(name);

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            number INTEGER NOT NULL CHECK (number >= 0),
            position TEXT NOT NULL,
            games INTEGER NULL,
            minutes_per_game REAL NULL,
            points_per_game REAL NULL,
            rebounds_per_game REAL NULL,
            assists_per_game REAL NULL,
            steals_per_game REAL NULL,
            blocks_per_game REAL NULL,
            fouls_per_game REAL NULL,
            turnovers_per_game REAL NULL,
            two_points_pct REAL NULL CHECK (two_points_pct BETWEEN 0 AND 1),
            three_points_pct REAL NULL CHECK (three_points_pct BETWEEN 0 AND 1),
            rating REAL NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
        CREATE INDEX IF NOT EXISTS idx_players_position ON players(position);

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source_path TEXT NOT NULL,
            reset INTEGER NOT NULL,
            sheets_total INTEGER NOT NULL,
            sheets_imported INTEGER NOT NULL,
            players_created INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn create_team(conn: &Connection, name: &str) -> Result<Team> {
    conn.execute("INSERT INTO teams(name, logo) VALUES (?1, NULL)", params![name])
        .with_context(|| format!("insert team {name}"))?;
    Ok(Team {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        logo: None,
    })
}

/// Returns the oldest team with exactly this name, creating one if none exists.
/// The boolean is `true` when the team was created.
pub fn get_or_create_team(conn: &Connection, name: &str) -> Result<(Team, bool)> {
    let existing = conn
        .query_row(
            "SELECT id, name, logo FROM teams WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            params![name],
            team_from_row,
        )
        .optional()
        .with_context(|| format!("lookup team {name}"))?;
    match existing {
        Some(team) => Ok((team, false)),
        None => Ok((create_team(conn, name)?, true)),
    }
}

pub fn find_team(conn: &Connection, team_id: i64) -> Result<Option<Team>> {
    conn.query_row(
        "SELECT id, name, logo FROM teams WHERE id = ?1",
        params![team_id],
        team_from_row,
    )
    .optional()
    .context("lookup team by id")
}

pub fn list_teams(conn: &Connection) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare("SELECT id, name, logo FROM teams ORDER BY name ASC, id ASC")
        .context("prepare list teams query")?;
    let rows = stmt
        .query_map([], team_from_row)
        .context("query list teams")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team row")?);
    }
    Ok(out)
}

pub fn set_team_logo(conn: &Connection, team_id: i64, logo: Option<&str>) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE teams SET logo = ?1 WHERE id = ?2",
            params![logo, team_id],
        )
        .context("update team logo")?;
    Ok(changed > 0)
}

/// Deletes a team; its players go with it through the foreign key cascade.
pub fn delete_team(conn: &Connection, team_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM teams WHERE id = ?1", params![team_id])
        .context("delete team")?;
    if changed > 0 {
        info!(team_id, "team deleted");
    }
    Ok(changed > 0)
}

pub fn insert_player(conn: &Connection, team_id: i64, p: &NewPlayer) -> Result<i64> {
    let s = &p.stats;
    conn.execute(
        r#"
        INSERT INTO players (
            team_id, name, number, position, games,
            minutes_per_game, points_per_game, rebounds_per_game, assists_per_game,
            steals_per_game, blocks_per_game, fouls_per_game, turnovers_per_game,
            two_points_pct, three_points_pct, rating
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16
        )
        "#,
        params![
            team_id,
            p.name,
            p.number as i64,
            p.position.label(),
            s.games,
            s.minutes_per_game,
            s.points_per_game,
            s.rebounds_per_game,
            s.assists_per_game,
            s.steals_per_game,
            s.blocks_per_game,
            s.fouls_per_game,
            s.turnovers_per_game,
            s.two_points_pct,
            s.three_points_pct,
            s.rating,
        ],
    )
    .with_context(|| format!("insert player {}", p.name))?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_all_players(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM players", [])
        .context("delete all players")
}

pub fn count_players(conn: &Connection) -> Result<usize> {
    let n = conn
        .query_row("SELECT COUNT(*) FROM players", [], |row| row.get::<_, i64>(0))
        .context("count players")?;
    Ok(usize::try_from(n).unwrap_or_default())
}

/// Players of one team in insertion order.
pub fn players_for_team(conn: &Connection, team_id: i64) -> Result<Vec<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = ?1 ORDER BY id ASC");
    load_players(conn, &sql, params![team_id])
}

pub fn all_players(conn: &Connection) -> Result<Vec<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id ASC");
    load_players(conn, &sql, [])
}

pub(crate) fn load_players(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Player>> {
    let mut stmt = conn.prepare(sql).context("prepare players query")?;
    let rows = stmt
        .query_map(params, player_from_row)
        .context("query players")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player row")?);
    }
    Ok(out)
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        logo: row.get(2)?,
    })
}

pub(crate) fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let position = row
        .get::<_, String>(4)?
        .parse::<Position>()
        .unwrap_or_default();
    Ok(Player {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        number: u32::try_from(row.get::<_, i64>(3)?).unwrap_or_default(),
        position,
        stats: PlayerStats {
            games: row.get(5)?,
            minutes_per_game: row.get(6)?,
            points_per_game: row.get(7)?,
            rebounds_per_game: row.get(8)?,
            assists_per_game: row.get(9)?,
            steals_per_game: row.get(10)?,
            blocks_per_game: row.get(11)?,
            fouls_per_game: row.get(12)?,
            turnovers_per_game: row.get(13)?,
            two_points_pct: row.get(14)?,
            three_points_pct: row.get(15)?,
            rating: row.get(16)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str) -> NewPlayer {
        NewPlayer {
            name: name.to_string(),
            number: 7,
            position: Position::Forward,
            stats: PlayerStats {
                points_per_game: Some(12.5),
                two_points_pct: Some(0.5),
                ..PlayerStats::default()
            },
        }
    }

    #[test]
    fn get_or_create_reuses_existing_team() {
        let conn = open_in_memory().unwrap();
        let (first, created) = get_or_create_team(&conn, "Lakers").unwrap();
        assert!(created);
        let (second, created) = get_or_create_team(&conn, "Lakers").unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(list_teams(&conn).unwrap().len(), 1);
    }

    #[test]
    fn delete_team_cascades_to_players() {
        let conn = open_in_memory().unwrap();
        let (lakers, _) = get_or_create_team(&conn, "Lakers").unwrap();
        let (celtics, _) = get_or_create_team(&conn, "Celtics").unwrap();
        insert_player(&conn, lakers.id, &player("A")).unwrap();
        insert_player(&conn, lakers.id, &player("B")).unwrap();
        insert_player(&conn, celtics.id, &player("C")).unwrap();

        assert!(delete_team(&conn, lakers.id).unwrap());
        assert_eq!(count_players(&conn).unwrap(), 1);
        assert_eq!(players_for_team(&conn, celtics.id).unwrap()[0].name, "C");
    }

    #[test]
    fn player_row_round_trips_absent_stats() {
        let conn = open_in_memory().unwrap();
        let (team, _) = get_or_create_team(&conn, "Bulls").unwrap();
        insert_player(&conn, team.id, &player("Jordan")).unwrap();
        let loaded = players_for_team(&conn, team.id).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].position, Position::Forward);
        assert_eq!(loaded[0].stats.points_per_game, Some(12.5));
        assert_eq!(loaded[0].stats.rebounds_per_game, None);
    }

    #[test]
    fn percentage_outside_unit_range_is_rejected() {
        let conn = open_in_memory().unwrap();
        let (team, _) = get_or_create_team(&conn, "Bulls").unwrap();
        let mut bad = player("Bad");
        bad.stats.three_points_pct = Some(1.5);
        assert!(insert_player(&conn, team.id, &bad).is_err());
    }

    #[test]
    fn logo_can_be_set_and_cleared() {
        let conn = open_in_memory().unwrap();
        let (team, _) = get_or_create_team(&conn, "Heat").unwrap();
        assert!(set_team_logo(&conn, team.id, Some("team_logos/heat.png")).unwrap());
        let loaded = find_team(&conn, team.id).unwrap().unwrap();
        assert_eq!(loaded.logo.as_deref(), Some("team_logos/heat.png"));
        assert!(set_team_logo(&conn, team.id, None).unwrap());
        assert!(find_team(&conn, team.id).unwrap().unwrap().logo.is_none());
    }
}
