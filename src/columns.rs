//! Canonical player fields and the spreadsheet header synonyms accepted for each.
//!
//! Lookups are case-insensitive and walk the synonym list in order; the first
//! header present in the sheet wins.

/// Lowercased labels that identify the player-name column.
pub const NAME_LABELS: &[&str] = &["player", "players", "name", "player name", "full name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Number,
    Position,
    Games,
    Minutes,
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Rating,
    Fouls,
    Turnovers,
    TwoPointPct,
    ThreePointPct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Percent,
    Position,
}

pub const FIELD_SYNONYMS: &[(Field, &[&str])] = &[
    (
        Field::Name,
        &["Player", "Players", "Name", "Player Name", "Full Name"],
    ),
    (Field::Number, &["Number", "#", "No"]),
    (Field::Position, &["Position", "Pos"]),
    (Field::Games, &["Games", "GP"]),
    (
        Field::Minutes,
        &["Minutes per game", "Min", "MIN", "Minutes"],
    ),
    (Field::Points, &["Points per game", "PTS", "PPG"]),
    (Field::Rebounds, &["Rebounds per game", "REB", "RPG"]),
    (Field::Assists, &["Assists per game", "AST", "APG"]),
    (Field::Steals, &["Steals per game", "STL", "SPG"]),
    (Field::Blocks, &["Blocks per game", "BLK", "BPG"]),
    (Field::Rating, &["Rating", "Eff", "EFF"]),
    (Field::Fouls, &["Fouls per game", "Fouls"]),
    (
        Field::Turnovers,
        &["Turnovers per game", "Turnovers", "TOV"],
    ),
    (
        Field::TwoPointPct,
        &["2 points %", "2PT%", "2PT %", "Two Points %"],
    ),
    (
        Field::ThreePointPct,
        &["3 points %", "3PT%", "3PT %", "Three Points %"],
    ),
];

impl Field {
    pub fn synonyms(self) -> &'static [&'static str] {
        FIELD_SYNONYMS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    /// Preferred header, written by the exporter.
    pub fn canonical_header(self) -> &'static str {
        self.synonyms().first().copied().unwrap_or("")
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Name => FieldKind::Text,
            Field::Number | Field::Games => FieldKind::Integer,
            Field::Position => FieldKind::Position,
            Field::TwoPointPct | Field::ThreePointPct => FieldKind::Percent,
            _ => FieldKind::Float,
        }
    }
}

/// Resolves `field` against `headers`, returning the matched column index.
pub fn lookup(headers: &[String], field: Field) -> Option<usize> {
    let lowered = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<Vec<_>>();
    field.synonyms().iter().find_map(|candidate| {
        let key = candidate.trim().to_lowercase();
        lowered.iter().position(|h| *h == key)
    })
}

/// Column index for every field present in `headers`, computed once per sheet.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    slots: Vec<(Field, usize)>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        let slots = FIELD_SYNONYMS
            .iter()
            .filter_map(|(field, _)| lookup(headers, *field).map(|idx| (*field, idx)))
            .collect();
        Self { slots }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.slots
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let h = headers(&["player", "ppg", "Reb"]);
        assert_eq!(lookup(&h, Field::Name), Some(0));
        assert_eq!(lookup(&h, Field::Points), Some(1));
        assert_eq!(lookup(&h, Field::Rebounds), Some(2));
        assert_eq!(lookup(&h, Field::Assists), None);
    }

    #[test]
    fn earlier_synonym_wins_over_column_order() {
        // "PTS" precedes "PPG" in the synonym list even though PPG comes first here.
        let h = headers(&["Name", "PPG", "PTS"]);
        assert_eq!(lookup(&h, Field::Points), Some(2));
    }

    #[test]
    fn every_field_has_synonyms() {
        for (field, names) in FIELD_SYNONYMS {
            assert!(!names.is_empty(), "{field:?} has no synonyms");
            assert_eq!(field.canonical_header(), names[0]);
        }
    }

    #[test]
    fn name_synonyms_match_name_labels() {
        let lowered = Field::Name
            .synonyms()
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>();
        assert_eq!(lowered, NAME_LABELS);
    }

    #[test]
    fn column_map_resolves_present_fields() {
        let h = headers(&["Full Name", "2PT %", "Three Points %"]);
        let map = ColumnMap::resolve(&h);
        assert_eq!(map.get(Field::Name), Some(0));
        assert_eq!(map.get(Field::TwoPointPct), Some(1));
        assert_eq!(map.get(Field::ThreePointPct), Some(2));
        assert_eq!(map.get(Field::Games), None);
    }
}
