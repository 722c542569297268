//! Team scouting reports.
//!
//! `fallback_report` is the deterministic summary used offline and whenever the
//! external text service fails. `scouting_report` is the longer narrative shown
//! on the team page; it never leaves the process.
//!
//! Leaders are the first player, in the order given, holding the maximum value.
//! Absent stats count as zero.

use tracing::{debug, warn};

use crate::ai_client::{ReportError, TextGenerator};
use crate::model::{Player, Stat, Team};

/// Team point total at or above which a roster reads as up-tempo.
pub const UP_TEMPO_POINTS: f64 = 80.0;
/// Team rebound total at or above which a roster reads as strong on the boards.
pub const STRONG_BOARDS_REBOUNDS: f64 = 40.0;

pub fn fallback_report(team: &Team, players: &[Player]) -> String {
    if players.is_empty() {
        return format!("No player statistics available yet for {}.", team.name);
    }

    let active = players
        .iter()
        .filter(|p| p.stat_or_zero(Stat::Minutes) > 0.0 || p.stat_or_zero(Stat::Points) > 0.0)
        .collect::<Vec<_>>();
    let active = if active.is_empty() {
        players.iter().collect()
    } else {
        active
    };

    let (Some(top_pts), Some(top_reb), Some(top_ast)) = (
        leader(&active, Stat::Points),
        leader(&active, Stat::Rebounds),
        leader(&active, Stat::Assists),
    ) else {
        return format!("No player statistics available yet for {}.", team.name);
    };

    let avg_pts = mean(active.iter().map(|p| p.stat(Stat::Points)));
    let avg_reb = mean(active.iter().map(|p| p.stat(Stat::Rebounds)));
    let avg_ast = mean(active.iter().map(|p| p.stat(Stat::Assists)));

    format!(
        "{team} lean on {pts_name} for scoring ({pts:.1} ppg), \
         {reb_name} on the boards ({reb:.1} rpg), and \
         {ast_name} for playmaking ({ast:.1} apg). \
         Across their active rotation they average roughly {avg_pts:.1} points, \
         {avg_reb:.1} rebounds, and {avg_ast:.1} assists per game.",
        team = team.name,
        pts_name = top_pts.name,
        pts = top_pts.stat_or_zero(Stat::Points),
        reb_name = top_reb.name,
        reb = top_reb.stat_or_zero(Stat::Rebounds),
        ast_name = top_ast.name,
        ast = top_ast.stat_or_zero(Stat::Assists),
    )
}

pub fn scouting_report(team: &Team, players: &[Player]) -> String {
    let everyone = players.iter().collect::<Vec<_>>();
    let (Some(scorer), Some(rebounder), Some(playmaker)) = (
        leader(&everyone, Stat::Points),
        leader(&everyone, Stat::Rebounds),
        leader(&everyone, Stat::Assists),
    ) else {
        return format!("No player data is available yet for {}.", team.name);
    };

    let team_pts: f64 = players.iter().map(|p| p.stat_or_zero(Stat::Points)).sum();
    let team_reb: f64 = players.iter().map(|p| p.stat_or_zero(Stat::Rebounds)).sum();
    let avg_rating = mean(players.iter().map(|p| p.stat(Stat::Rating)));

    let tempo = if team_pts >= UP_TEMPO_POINTS {
        "an up-tempo, offense-first"
    } else {
        "a more half-court oriented"
    };
    let glass = if team_reb >= STRONG_BOARDS_REBOUNDS {
        "strong on the boards"
    } else {
        "vulnerable on the boards"
    };

    format!(
        "{team} lean heavily on {s} ({s_pts:.1} PPG) as their primary scoring option, \
         while {r} anchors the paint with {r_reb:.1} rebounds per game. \
         {a} runs the offense and averages {a_ast:.1} assists, keeping teammates involved. \
         As a group, the team scores around {team_pts:.1} points and collects \
         {team_reb:.1} rebounds per game, with an average efficiency rating of \
         {avg_rating:.1}. This profile points to {tempo} squad that is {glass}. \
         To slow them down, opponents should limit early touches for {s}, \
         keep {r} off the glass, and force the ball out of {a}'s hands late in possessions.",
        team = team.name,
        s = scorer.name,
        s_pts = scorer.stat_or_zero(Stat::Points),
        r = rebounder.name,
        r_reb = rebounder.stat_or_zero(Stat::Rebounds),
        a = playmaker.name,
        a_ast = playmaker.stat_or_zero(Stat::Assists),
    )
}

/// Roster lines plus instructions sent to the text service.
pub fn build_prompt(team: &Team, players: &[Player]) -> String {
    let roster = if players.is_empty() {
        "No players.".to_string()
    } else {
        players
            .iter()
            .map(|p| {
                format!(
                    "{} ({}) - {:.1} PTS, {:.1} REB, {:.1} AST; rating {:.1}",
                    p.name,
                    p.position,
                    p.stat_or_zero(Stat::Points),
                    p.stat_or_zero(Stat::Rebounds),
                    p.stat_or_zero(Stat::Assists),
                    p.stat_or_zero(Stat::Rating),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Analyze basketball team \"{}\" using these player stats:\n\n{roster}\n\n\
         Write 3-5 sentences about: main scorers, rebounders, playmaking, and a quick \
         style/strengths note. Be concise.",
        team.name
    )
}

/// Asks the text service for a report. Blank output counts as a failure.
pub fn request_report(
    generator: &dyn TextGenerator,
    team: &Team,
    players: &[Player],
) -> Result<String, ReportError> {
    let text = generator.generate(&build_prompt(team, players))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ReportError::EmptyResponse);
    }
    Ok(text.to_string())
}

/// Report text for display. Uses the text service when one is configured and
/// falls back to `fallback_report` on any failure; never errors.
pub fn generate_team_report(
    generator: Option<&dyn TextGenerator>,
    team: &Team,
    players: &[Player],
) -> String {
    let Some(generator) = generator else {
        debug!(team = %team.name, "no text service configured; using offline report");
        return fallback_report(team, players);
    };
    match request_report(generator, team, players) {
        Ok(text) => text,
        Err(err) => {
            warn!(team = %team.name, error = %err, "text service failed; using offline report");
            fallback_report(team, players)
        }
    }
}

fn leader<'p>(players: &[&'p Player], stat: Stat) -> Option<&'p Player> {
    let mut best: Option<&'p Player> = None;
    for &p in players {
        match best {
            Some(b) if p.stat_or_zero(stat) <= b.stat_or_zero(stat) => {}
            _ => best = Some(p),
        }
    }
    best
}

/// Mean of the recorded values; 0.0 when none are recorded.
fn mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::MockTextGenerator;
    use crate::model::{PlayerStats, Position};

    fn team(name: &str) -> Team {
        Team {
            id: 1,
            name: name.to_string(),
            logo: None,
        }
    }

    fn player(id: i64, name: &str, pts: f64, reb: f64, ast: f64) -> Player {
        Player {
            id,
            team_id: 1,
            name: name.to_string(),
            number: id as u32,
            position: Position::Guard,
            stats: PlayerStats {
                minutes_per_game: Some(30.0),
                points_per_game: Some(pts),
                rebounds_per_game: Some(reb),
                assists_per_game: Some(ast),
                rating: Some(15.0),
                ..PlayerStats::default()
            },
        }
    }

    fn abc() -> Vec<Player> {
        vec![
            player(1, "A", 20.0, 5.0, 3.0),
            player(2, "B", 10.0, 12.0, 2.0),
            player(3, "C", 8.0, 4.0, 9.0),
        ]
    }

    #[test]
    fn fallback_on_empty_roster() {
        assert_eq!(
            fallback_report(&team("Lakers"), &[]),
            "No player statistics available yet for Lakers."
        );
    }

    #[test]
    fn fallback_names_leaders_and_averages() {
        let text = fallback_report(&team("Lakers"), &abc());
        assert_eq!(
            text,
            "Lakers lean on A for scoring (20.0 ppg), B on the boards (12.0 rpg), and \
             C for playmaking (9.0 apg). Across their active rotation they average roughly \
             12.7 points, 7.0 rebounds, and 4.7 assists per game."
        );
    }

    #[test]
    fn fallback_ignores_inactive_players() {
        let mut roster = abc();
        let mut bench = player(4, "Bench", 0.0, 30.0, 0.0);
        bench.stats.minutes_per_game = Some(0.0);
        roster.push(bench);
        let text = fallback_report(&team("Lakers"), &roster);
        assert!(text.contains("B on the boards (12.0 rpg)"));
        assert!(text.contains("7.0 rebounds"));
    }

    #[test]
    fn fallback_uses_whole_roster_when_nobody_played() {
        let mut idle = player(1, "Idle", 0.0, 2.0, 1.0);
        idle.stats.minutes_per_game = Some(0.0);
        let text = fallback_report(&team("Kings"), &[idle]);
        assert!(text.starts_with("Kings lean on Idle for scoring (0.0 ppg)"));
    }

    #[test]
    fn ties_go_to_first_player() {
        let roster = vec![
            player(1, "First", 10.0, 5.0, 5.0),
            player(2, "Second", 10.0, 5.0, 5.0),
        ];
        let text = fallback_report(&team("Nets"), &roster);
        assert!(text.starts_with("Nets lean on First for scoring"));
        assert!(text.contains("First on the boards"));
    }

    #[test]
    fn scouting_report_labels_tempo_and_glass() {
        let roster = vec![
            player(1, "A", 30.0, 15.0, 3.0),
            player(2, "B", 25.0, 15.0, 8.0),
            player(3, "C", 25.0, 10.0, 2.0),
        ];
        let text = scouting_report(&team("Celtics"), &roster);
        assert!(text.starts_with("Celtics lean heavily on A (30.0 PPG)"));
        assert!(text.contains("around 80.0 points and collects 40.0 rebounds"));
        assert!(text.contains("an up-tempo, offense-first squad that is strong on the boards"));
        assert!(text.contains("average efficiency rating of 15.0"));
        assert!(text.ends_with("force the ball out of B's hands late in possessions."));
    }

    #[test]
    fn scouting_report_slow_team() {
        let text = scouting_report(&team("Jazz"), &abc());
        assert!(text.contains("a more half-court oriented squad that is vulnerable on the boards"));
    }

    #[test]
    fn scouting_report_empty_roster() {
        assert_eq!(
            scouting_report(&team("Jazz"), &[]),
            "No player data is available yet for Jazz."
        );
    }

    #[test]
    fn prompt_lists_roster_lines() {
        let prompt = build_prompt(&team("Lakers"), &abc()[..1]);
        assert!(prompt.contains("Analyze basketball team \"Lakers\""));
        assert!(prompt.contains("A (Guard) - 20.0 PTS, 5.0 REB, 3.0 AST; rating 15.0"));
        assert!(build_prompt(&team("Lakers"), &[]).contains("No players."));
    }

    #[test]
    fn service_failure_falls_back_byte_for_byte() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(ReportError::Transport("connection refused".to_string())));
        let roster = abc();
        let out = generate_team_report(Some(&generator), &team("Lakers"), &roster);
        assert_eq!(out, fallback_report(&team("Lakers"), &roster));
    }

    #[test]
    fn blank_service_output_falls_back() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("   \n".to_string()));
        let roster = abc();
        let out = generate_team_report(Some(&generator), &team("Lakers"), &roster);
        assert_eq!(out, fallback_report(&team("Lakers"), &roster));
    }

    #[test]
    fn service_text_is_trimmed() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| prompt.contains("\"Lakers\""))
            .returning(|_| Ok("  Solid team.\n".to_string()));
        let out = generate_team_report(Some(&generator), &team("Lakers"), &abc());
        assert_eq!(out, "Solid team.");
    }

    #[test]
    fn no_service_means_offline_report() {
        let out = generate_team_report(None, &team("Lakers"), &[]);
        assert_eq!(out, "No player statistics available yet for Lakers.");
    }
}
