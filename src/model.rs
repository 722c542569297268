use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// Opaque asset path, managed outside the importer.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Guard,
    Forward,
    Center,
    GuardForward,
    ForwardCenter,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::Guard,
        Position::Forward,
        Position::Center,
        Position::GuardForward,
        Position::ForwardCenter,
    ];

    /// Label persisted in the `players.position` column.
    pub fn label(self) -> &'static str {
        match self {
            Position::Guard => "Guard",
            Position::Forward => "Forward",
            Position::Center => "Center",
            Position::GuardForward => "Guard / Forward",
            Position::ForwardCenter => "Forward / Center",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPosition(pub String);

impl fmt::Display for UnknownPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown position '{}'", self.0)
    }
}

impl std::error::Error for UnknownPosition {}

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let compact = raw
            .split('/')
            .map(|part| part.trim().to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("/");
        match compact.as_str() {
            "guard" => Ok(Position::Guard),
            "forward" => Ok(Position::Forward),
            "center" => Ok(Position::Center),
            "guard/forward" => Ok(Position::GuardForward),
            "forward/center" => Ok(Position::ForwardCenter),
            _ => Err(UnknownPosition(raw.to_string())),
        }
    }
}

/// Per-game statistics. `None` means the value was never recorded, which is
/// distinct from a recorded zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games: Option<i64>,
    pub minutes_per_game: Option<f64>,
    pub points_per_game: Option<f64>,
    pub rebounds_per_game: Option<f64>,
    pub assists_per_game: Option<f64>,
    pub steals_per_game: Option<f64>,
    pub blocks_per_game: Option<f64>,
    pub fouls_per_game: Option<f64>,
    pub turnovers_per_game: Option<f64>,
    /// Fraction in `[0, 1]`.
    pub two_points_pct: Option<f64>,
    /// Fraction in `[0, 1]`.
    pub three_points_pct: Option<f64>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub number: u32,
    pub position: Position,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

/// A player row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub number: u32,
    pub position: Position,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Points,
    Rebounds,
    Assists,
    Minutes,
    TwoPointPct,
    ThreePointPct,
    Rating,
}

impl Stat {
    /// Column name in the `players` table.
    pub fn column(self) -> &'static str {
        match self {
            Stat::Points => "points_per_game",
            Stat::Rebounds => "rebounds_per_game",
            Stat::Assists => "assists_per_game",
            Stat::Minutes => "minutes_per_game",
            Stat::TwoPointPct => "two_points_pct",
            Stat::ThreePointPct => "three_points_pct",
            Stat::Rating => "rating",
        }
    }
}

impl Player {
    pub fn stat(&self, stat: Stat) -> Option<f64> {
        let s = &self.stats;
        match stat {
            Stat::Points => s.points_per_game,
            Stat::Rebounds => s.rebounds_per_game,
            Stat::Assists => s.assists_per_game,
            Stat::Minutes => s.minutes_per_game,
            Stat::TwoPointPct => s.two_points_pct,
            Stat::ThreePointPct => s.three_points_pct,
            Stat::Rating => s.rating,
        }
    }

    /// Stat value with absent treated as zero, for rendering.
    pub fn stat_or_zero(&self, stat: Stat) -> f64 {
        self.stat(stat).unwrap_or(0.0)
    }
}

/// Stored fraction scaled to a 0-100 display value; absent renders as 0.
pub fn display_pct(fraction: Option<f64>) -> f64 {
    fraction.map(|v| v * 100.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::{Position, display_pct};

    #[test]
    fn position_parses_labels_loosely() {
        assert_eq!("guard".parse::<Position>(), Ok(Position::Guard));
        assert_eq!("Guard / Forward".parse::<Position>(), Ok(Position::GuardForward));
        assert_eq!("forward/center".parse::<Position>(), Ok(Position::ForwardCenter));
        assert!("point".parse::<Position>().is_err());
    }

    #[test]
    fn position_labels_round_trip() {
        for pos in Position::ALL {
            assert_eq!(pos.label().parse::<Position>(), Ok(pos));
        }
    }

    #[test]
    fn display_pct_scales_fraction() {
        assert!((display_pct(Some(0.61)) - 61.0).abs() < 1e-9);
        assert_eq!(display_pct(None), 0.0);
    }
}
