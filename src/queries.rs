//! Read-only league and team queries. Everything is computed on demand.
//!
//! Leader ties resolve to the earliest inserted player (lowest id). Absent
//! values sort below every recorded value.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::db::{self, PLAYER_COLUMNS, player_from_row};
use crate::model::{Player, Position, Stat, Team};
use crate::report;

pub const TOP_N: usize = 5;
pub const SCORING_BREAKDOWN_N: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct LeagueOverview {
    pub teams: Vec<Team>,
    pub best_scorer: Option<Player>,
    pub best_rebounder: Option<Player>,
    pub assist_leader: Option<Player>,
    pub best_two_pct: Option<Player>,
    pub best_three_pct: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAggregates {
    pub players: usize,
    pub total_points: f64,
    pub total_rebounds: f64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamDetail {
    pub team: Team,
    /// Roster ordered by points per game, best first.
    pub players: Vec<Player>,
    pub top_scorers: Vec<ChartPoint>,
    pub top_rebounders: Vec<ChartPoint>,
    pub scoring_breakdown: Vec<ChartPoint>,
    pub aggregates: TeamAggregates,
    pub scouting_report: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeamSelector {
    #[default]
    All,
    Team(i64),
    /// Unrecognised team id; matches no team.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionSelector {
    #[default]
    All,
    Only(Position),
    /// Unrecognised position label; matches no stored position.
    Unknown(String),
}

/// Player search criteria. Unset thresholds are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    pub team: TeamSelector,
    pub position: PositionSelector,
    pub min_points: Option<f64>,
    pub min_rebounds: Option<f64>,
    pub min_assists: Option<f64>,
    pub min_minutes: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_fouls: Option<f64>,
    /// 0-100 scale.
    pub min_two_pt: Option<f64>,
    /// 0-100 scale.
    pub min_three_pt: Option<f64>,
    /// Case-insensitive substring of the player name.
    pub name: Option<String>,
}

/// Raw string inputs, as they arrive from a form or the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterParams<'a> {
    pub team_id: Option<&'a str>,
    pub position: Option<&'a str>,
    pub min_points: Option<&'a str>,
    pub min_rebounds: Option<&'a str>,
    pub min_assists: Option<&'a str>,
    pub min_minutes: Option<&'a str>,
    pub min_rating: Option<&'a str>,
    pub max_fouls: Option<&'a str>,
    pub min_two_pt: Option<&'a str>,
    pub min_three_pt: Option<&'a str>,
    pub name: Option<&'a str>,
}

impl PlayerFilter {
    /// Lenient parse: unparseable numbers are treated as not supplied. An
    /// unknown team or position selector is kept and matches nothing.
    pub fn from_params(p: &FilterParams<'_>) -> Self {
        let team = match p.team_id.map(str::trim) {
            None | Some("") | Some("all") => TeamSelector::All,
            Some(raw) => raw
                .parse::<i64>()
                .map(TeamSelector::Team)
                .unwrap_or_else(|_| TeamSelector::Unknown(raw.to_string())),
        };
        let position = match p.position.map(str::trim) {
            None | Some("") | Some("all") => PositionSelector::All,
            Some(raw) => raw
                .parse::<Position>()
                .map(PositionSelector::Only)
                .unwrap_or_else(|_| PositionSelector::Unknown(raw.to_string())),
        };
        Self {
            team,
            position,
            min_points: parse_threshold(p.min_points),
            min_rebounds: parse_threshold(p.min_rebounds),
            min_assists: parse_threshold(p.min_assists),
            min_minutes: parse_threshold(p.min_minutes),
            min_rating: parse_threshold(p.min_rating),
            max_fouls: parse_threshold(p.max_fouls),
            min_two_pt: parse_threshold(p.min_two_pt),
            min_three_pt: parse_threshold(p.min_three_pt),
            name: p
                .name
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

pub fn parse_threshold(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn league_overview(conn: &Connection) -> Result<LeagueOverview> {
    Ok(LeagueOverview {
        teams: db::list_teams(conn)?,
        best_scorer: league_leader(conn, Stat::Points)?,
        best_rebounder: league_leader(conn, Stat::Rebounds)?,
        assist_leader: league_leader(conn, Stat::Assists)?,
        best_two_pct: league_leader(conn, Stat::TwoPointPct)?,
        best_three_pct: league_leader(conn, Stat::ThreePointPct)?,
    })
}

/// Player with the highest `stat` across the league. Players without a value
/// for the stat are not ranked.
pub fn league_leader(conn: &Connection, stat: Stat) -> Result<Option<Player>> {
    let col = stat.column();
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players WHERE {col} IS NOT NULL \
         ORDER BY {col} DESC, id ASC LIMIT 1"
    );
    conn.query_row(&sql, [], player_from_row)
        .optional()
        .with_context(|| format!("query league leader for {col}"))
}

/// Top `limit` players of a team by `stat`, absent values last.
pub fn team_top(conn: &Connection, team_id: i64, stat: Stat, limit: usize) -> Result<Vec<Player>> {
    let col = stat.column();
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = ?1 \
         ORDER BY {col} IS NULL ASC, {col} DESC, id ASC LIMIT ?2"
    );
    db::load_players(conn, &sql, params![team_id, limit as i64])
}

pub fn team_aggregates(conn: &Connection, team_id: i64) -> Result<TeamAggregates> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(points_per_game), 0), \
         COALESCE(SUM(rebounds_per_game), 0), COALESCE(AVG(rating), 0) \
         FROM players WHERE team_id = ?1",
        params![team_id],
        |row| {
            Ok(TeamAggregates {
                players: usize::try_from(row.get::<_, i64>(0)?).unwrap_or_default(),
                total_points: row.get(1)?,
                total_rebounds: row.get(2)?,
                avg_rating: row.get(3)?,
            })
        },
    )
    .context("query team aggregates")
}

/// Everything the team page shows; `None` when the team does not exist.
pub fn team_detail(conn: &Connection, team_id: i64) -> Result<Option<TeamDetail>> {
    let Some(team) = db::find_team(conn, team_id)? else {
        return Ok(None);
    };
    let roster = db::players_for_team(conn, team_id)?;
    let scouting_report = report::scouting_report(&team, &roster);

    Ok(Some(TeamDetail {
        players: team_top(conn, team_id, Stat::Points, roster.len())?,
        top_scorers: chart(&team_top(conn, team_id, Stat::Points, TOP_N)?, Stat::Points),
        top_rebounders: chart(
            &team_top(conn, team_id, Stat::Rebounds, TOP_N)?,
            Stat::Rebounds,
        ),
        scoring_breakdown: chart(
            &team_top(conn, team_id, Stat::Points, SCORING_BREAKDOWN_N)?,
            Stat::Points,
        ),
        aggregates: team_aggregates(conn, team_id)?,
        scouting_report,
        team,
    }))
}

fn chart(players: &[Player], stat: Stat) -> Vec<ChartPoint> {
    players
        .iter()
        .map(|p| ChartPoint {
            name: p.name.clone(),
            value: p.stat_or_zero(stat),
        })
        .collect()
}

/// Players matching `filter`, by rating then points per game, both descending.
pub fn search_players(conn: &Connection, filter: &PlayerFilter) -> Result<Vec<Player>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<rusqlite::types::Value> = Vec::new();
    // `clause` holds one `?`, replaced by the numbered parameter.
    let mut push = |clause: &str, value: rusqlite::types::Value| {
        values.push(value);
        clauses.push(clause.replacen('?', &format!("?{}", values.len()), 1));
    };

    match &filter.team {
        TeamSelector::All => {}
        TeamSelector::Team(id) => push("team_id = ?", (*id).into()),
        TeamSelector::Unknown(raw) => push("CAST(team_id AS TEXT) = ?", raw.clone().into()),
    }
    match &filter.position {
        PositionSelector::All => {}
        PositionSelector::Only(pos) => push("position = ?", pos.label().to_string().into()),
        PositionSelector::Unknown(raw) => push("position = ?", raw.clone().into()),
    }
    let thresholds = [
        ("points_per_game >= ?", filter.min_points),
        ("rebounds_per_game >= ?", filter.min_rebounds),
        ("assists_per_game >= ?", filter.min_assists),
        ("minutes_per_game >= ?", filter.min_minutes),
        ("rating >= ?", filter.min_rating),
        ("fouls_per_game <= ?", filter.max_fouls),
        ("two_points_pct >= ?", filter.min_two_pt.map(|v| v / 100.0)),
        ("three_points_pct >= ?", filter.min_three_pt.map(|v| v / 100.0)),
    ];
    for (clause, value) in thresholds {
        if let Some(v) = value {
            push(clause, v.into());
        }
    }
    if let Some(name) = &filter.name {
        push("instr(LOWER(name), ?) > 0", name.to_ascii_lowercase().into());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players {where_sql} \
         ORDER BY rating IS NULL ASC, rating DESC, \
         points_per_game IS NULL ASC, points_per_game DESC, id ASC"
    );
    db::load_players(conn, &sql, rusqlite::params_from_iter(values))
}
