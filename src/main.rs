use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use courtside::ai_client::{OpenAiClient, TextGenerator};
use courtside::config::Config;
use courtside::importer::{self, ImportOptions, ImportReport};
use courtside::model::{Player, Team, display_pct};
use courtside::queries::{self, FilterParams, PlayerFilter};
use courtside::{db, export, report};

#[derive(Debug, Parser)]
#[command(name = "courtside", version, about = "Basketball team and player statistics")]
struct Cli {
    /// SQLite database path.
    #[arg(long, global = true, env = "COURTSIDE_DB")]
    db: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import teams and players from a workbook (one sheet per team).
    Import {
        xlsx_path: PathBuf,
        /// Delete existing players before import.
        #[arg(long)]
        reset: bool,
        /// Print detected header row and columns per sheet.
        #[arg(long)]
        debug: bool,
    },
    /// List teams with league leaders.
    Teams,
    /// Team roster, charts and scouting report.
    Team { team_id: i64 },
    /// Filtered player search.
    Search(SearchArgs),
    /// Short analytical report for a team.
    Report {
        team_id: i64,
        /// Skip the text service and use the offline report.
        #[arg(long)]
        offline: bool,
    },
    /// Write every team to a workbook the importer can read back.
    Export { xlsx_path: PathBuf },
    /// Delete a team and all of its players.
    DeleteTeam { team_id: i64 },
    /// Set a team's logo path; omit the path to clear it.
    SetLogo {
        team_id: i64,
        logo: Option<String>,
    },
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Team id or "all".
    #[arg(long, default_value = "all")]
    team: String,
    /// Position label or "all".
    #[arg(long, default_value = "all")]
    position: String,
    #[arg(long)]
    min_points: Option<String>,
    #[arg(long)]
    min_rebounds: Option<String>,
    #[arg(long)]
    min_assists: Option<String>,
    #[arg(long)]
    min_minutes: Option<String>,
    #[arg(long)]
    min_rating: Option<String>,
    #[arg(long)]
    max_fouls: Option<String>,
    /// Minimum two-point percentage, 0-100.
    #[arg(long)]
    min_two_pt: Option<String>,
    /// Minimum three-point percentage, 0-100.
    #[arg(long)]
    min_three_pt: Option<String>,
    /// Name contains (case-insensitive).
    #[arg(long)]
    name: Option<String>,
}

impl SearchArgs {
    fn to_filter(&self) -> PlayerFilter {
        PlayerFilter::from_params(&FilterParams {
            team_id: Some(self.team.as_str()),
            position: Some(self.position.as_str()),
            min_points: self.min_points.as_deref(),
            min_rebounds: self.min_rebounds.as_deref(),
            min_assists: self.min_assists.as_deref(),
            min_minutes: self.min_minutes.as_deref(),
            min_rating: self.min_rating.as_deref(),
            max_fouls: self.max_fouls.as_deref(),
            min_two_pt: self.min_two_pt.as_deref(),
            min_three_pt: self.min_three_pt.as_deref(),
            name: self.name.as_deref(),
        })
    }
}

fn main() -> Result<()> {
    let config = Config::from_env();
    init_logging();

    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let mut conn = db::open_db(&db_path)?;

    match &cli.command {
        Command::Import {
            xlsx_path,
            reset,
            debug,
        } => {
            let options = ImportOptions {
                reset: *reset,
                debug: *debug,
            };
            let summary = importer::import_workbook(&mut conn, xlsx_path, options)
                .with_context(|| format!("import {} failed", xlsx_path.display()))?;
            if cli.json {
                print_json(&summary)?;
            } else {
                print_import(&summary, *debug);
            }
        }
        Command::Teams => {
            let overview = queries::league_overview(&conn)?;
            if cli.json {
                print_json(&overview)?;
                return Ok(());
            }
            let teams = &overview.teams;
            println!("Teams ({})", teams.len());
            for team in teams {
                println!("  [{}] {}", team.id, team.name);
            }
            println!();
            println!("League leaders");
            print_leader("Points", overview.best_scorer.as_ref(), |p| {
                format!("{:.1} ppg", p.stats.points_per_game.unwrap_or(0.0))
            }, teams);
            print_leader("Rebounds", overview.best_rebounder.as_ref(), |p| {
                format!("{:.1} rpg", p.stats.rebounds_per_game.unwrap_or(0.0))
            }, teams);
            print_leader("Assists", overview.assist_leader.as_ref(), |p| {
                format!("{:.1} apg", p.stats.assists_per_game.unwrap_or(0.0))
            }, teams);
            print_leader("2PT%", overview.best_two_pct.as_ref(), |p| {
                format!("{:.1}%", display_pct(p.stats.two_points_pct))
            }, teams);
            print_leader("3PT%", overview.best_three_pct.as_ref(), |p| {
                format!("{:.1}%", display_pct(p.stats.three_points_pct))
            }, teams);
        }
        Command::Team { team_id } => {
            let detail = queries::team_detail(&conn, *team_id)?
                .ok_or_else(|| anyhow!("team {team_id} not found"))?;
            if cli.json {
                print_json(&detail)?;
                return Ok(());
            }
            println!("{}", detail.team.name);
            if let Some(logo) = &detail.team.logo {
                println!("Logo: {logo}");
            }
            println!();
            println!("{}", detail.scouting_report);
            println!();
            println!(
                "Team totals: {:.1} pts, {:.1} reb, avg rating {:.1}",
                detail.aggregates.total_points,
                detail.aggregates.total_rebounds,
                detail.aggregates.avg_rating
            );
            println!();
            println!("Top scorers");
            for point in &detail.top_scorers {
                println!("  {:<24} {:>6.1}", point.name, point.value);
            }
            println!("Top rebounders");
            for point in &detail.top_rebounders {
                println!("  {:<24} {:>6.1}", point.name, point.value);
            }
            let total: f64 = detail.scoring_breakdown.iter().map(|p| p.value).sum();
            println!("Scoring distribution");
            for point in &detail.scoring_breakdown {
                let share = if total > 0.0 { point.value / total * 100.0 } else { 0.0 };
                println!("  {:<24} {:>5.1}%", point.name, share);
            }
            println!();
            print_players(&detail.players, None);
        }
        Command::Search(args) => {
            let filter = args.to_filter();
            let players = queries::search_players(&conn, &filter)?;
            if cli.json {
                print_json(&players)?;
                return Ok(());
            }
            let teams = db::list_teams(&conn)?;
            println!("{} player(s)", players.len());
            print_players(&players, Some(teams.as_slice()));
        }
        Command::Report { team_id, offline } => {
            let team = db::find_team(&conn, *team_id)?
                .ok_or_else(|| anyhow!("team {team_id} not found"))?;
            let players = db::players_for_team(&conn, *team_id)?;
            let client = if *offline {
                None
            } else {
                OpenAiClient::from_settings(&config.openai)
            };
            let generator = client.as_ref().map(|c| c as &dyn TextGenerator);
            let text = report::generate_team_report(generator, &team, &players);
            if cli.json {
                print_json(&serde_json::json!({ "team": team, "report": text }))?;
            } else {
                println!("{text}");
            }
        }
        Command::Export { xlsx_path } => {
            let summary = export::export_workbook(&conn, xlsx_path)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!(
                    "Exported {} team(s), {} player(s) to {}",
                    summary.teams,
                    summary.players,
                    xlsx_path.display()
                );
            }
        }
        Command::DeleteTeam { team_id } => {
            if !db::delete_team(&conn, *team_id)? {
                return Err(anyhow!("team {team_id} not found"));
            }
            println!("Deleted team {team_id}");
        }
        Command::SetLogo { team_id, logo } => {
            let logo = logo.as_deref().map(str::trim).filter(|s| !s.is_empty());
            if !db::set_team_logo(&conn, *team_id, logo)? {
                return Err(anyhow!("team {team_id} not found"));
            }
            match logo {
                Some(path) => println!("Team {team_id} logo set to {path}"),
                None => println!("Team {team_id} logo cleared"),
            }
        }
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,courtside=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn print_import(summary: &ImportReport, debug: bool) {
    if summary.reset {
        println!("Deleted {} existing player(s)", summary.players_deleted);
    }
    for sheet in &summary.sheets {
        if debug {
            println!(
                "[{}] header row={} | columns={:?}",
                sheet.sheet, sheet.header_row, sheet.columns
            );
        }
        match &sheet.skipped {
            Some(reason) => println!("[{}] skipped: {reason}", sheet.team_name),
            None => println!("[{}] imported {} players.", sheet.team_name, sheet.created),
        }
    }
    println!("Done. Total players imported: {}", summary.total_created);
}

fn print_leader(
    label: &str,
    player: Option<&Player>,
    value: impl Fn(&Player) -> String,
    teams: &[Team],
) {
    match player {
        Some(p) => println!(
            "  {label:<9} {} ({}) {}",
            p.name,
            team_name(teams, p.team_id),
            value(p)
        ),
        None => println!("  {label:<9} n/a"),
    }
}

fn print_players(players: &[Player], teams: Option<&[Team]>) {
    println!(
        "{:>3}  {:<24} {:<17} {:>4} {:>5} {:>5} {:>5} {:>5} {:>5} {:>6} {:>6} {:>6}{}",
        "#", "Player", "Pos", "GP", "MIN", "PTS", "REB", "AST", "PF", "2PT%", "3PT%", "RTG",
        if teams.is_some() { "  Team" } else { "" }
    );
    for p in players {
        let s = &p.stats;
        let team = teams
            .map(|t| format!("  {}", team_name(t, p.team_id)))
            .unwrap_or_default();
        println!(
            "{:>3}  {:<24} {:<17} {:>4} {:>5.1} {:>5.1} {:>5.1} {:>5.1} {:>5.1} {:>6.1} {:>6.1} {:>6.1}{team}",
            p.number,
            p.name,
            p.position.label(),
            s.games.unwrap_or(0),
            s.minutes_per_game.unwrap_or(0.0),
            s.points_per_game.unwrap_or(0.0),
            s.rebounds_per_game.unwrap_or(0.0),
            s.assists_per_game.unwrap_or(0.0),
            s.fouls_per_game.unwrap_or(0.0),
            display_pct(s.two_points_pct),
            display_pct(s.three_points_pct),
            s.rating.unwrap_or(0.0),
        );
    }
}

fn team_name(teams: &[Team], team_id: i64) -> &str {
    teams
        .iter()
        .find(|t| t.id == team_id)
        .map(|t| t.name.as_str())
        .unwrap_or("?")
}
