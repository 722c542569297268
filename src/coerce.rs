//! Lenient conversions from spreadsheet cells to typed player fields.
//! None of these fail: bad input collapses to a documented default.

use crate::model::Position;
use crate::sheet::Cell;

/// Integer with non-numeric or absent input mapped to `default`.
/// Text must look like `-?\d+(\.\d+)?`; fractional values truncate toward zero.
pub fn as_int(cell: Option<&Cell>, default: i64) -> i64 {
    match cell {
        None | Some(Cell::Empty) => default,
        Some(Cell::Int(n)) => *n,
        Some(Cell::Float(f)) if f.is_finite() => f.trunc() as i64,
        Some(Cell::Float(_)) => default,
        Some(Cell::Bool(b)) => i64::from(*b),
        Some(Cell::Text(s)) => {
            let s = s.trim();
            if !looks_numeric(s) {
                return default;
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
                .unwrap_or(default)
        }
    }
}

/// Float accepting a comma decimal separator; NaN, infinities and junk map to `default`.
pub fn as_float(cell: Option<&Cell>, default: f64) -> f64 {
    let value = match cell {
        None | Some(Cell::Empty) => None,
        Some(Cell::Int(n)) => Some(*n as f64),
        Some(Cell::Float(f)) => Some(*f),
        Some(Cell::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Cell::Text(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
    };
    value.filter(|f| f.is_finite()).unwrap_or(default)
}

/// Percentage as a fraction in `[0, 1]`: `61` and `0.61` both become `0.61`.
pub fn pct01(cell: Option<&Cell>) -> f64 {
    let mut f = as_float(cell, 0.0);
    if f > 1.0 {
        f /= 100.0;
    }
    f.clamp(0.0, 1.0)
}

/// Title-cased single-word position, or `Guard` when unrecognised.
pub fn norm_pos(cell: Option<&Cell>) -> Position {
    let Some(cell) = cell.filter(|c| !c.is_blank()) else {
        return Position::Guard;
    };
    match title_case(cell.to_label().trim()).as_str() {
        "Forward" => Position::Forward,
        "Center" => Position::Center,
        _ => Position::Guard,
    }
}

/// Trimmed player name, or `None` when the cell is blank.
pub fn as_name(cell: Option<&Cell>) -> Option<String> {
    let cell = cell.filter(|c| !c.is_blank())?;
    let name = cell.to_label().trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

/// Uppercases the first letter of each alphabetic run and lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    #[test]
    fn pct01_accepts_whole_and_fractional_percentages() {
        assert!((pct01(Some(&Cell::Int(61))) - 0.61).abs() < 1e-12);
        assert!((pct01(Some(&Cell::Float(0.61))) - 0.61).abs() < 1e-12);
        assert!((pct01(Some(&t("61"))) - 0.61).abs() < 1e-12);
        assert!((pct01(Some(&t("0,61"))) - 0.61).abs() < 1e-12);
    }

    #[test]
    fn pct01_stays_in_unit_range() {
        for raw in [-5.0, 0.0, 0.5, 1.0, 1.5, 99.9, 100.0, 250.0, 1e9] {
            let v = pct01(Some(&Cell::Float(raw)));
            assert!((0.0..=1.0).contains(&v), "{raw} -> {v}");
        }
        assert_eq!(pct01(Some(&t("n/a"))), 0.0);
        assert_eq!(pct01(None), 0.0);
    }

    #[test]
    fn as_int_is_lenient() {
        assert_eq!(as_int(Some(&t(" 23 ")), 0), 23);
        assert_eq!(as_int(Some(&t("7.9")), 0), 7);
        assert_eq!(as_int(Some(&t("-3")), 0), -3);
        assert_eq!(as_int(Some(&t("1e3")), 0), 0);
        assert_eq!(as_int(Some(&t("#12")), 0), 0);
        assert_eq!(as_int(Some(&Cell::Float(12.0)), 0), 12);
        assert_eq!(as_int(Some(&Cell::Float(f64::NAN)), 0), 0);
        assert_eq!(as_int(None, 0), 0);
    }

    #[test]
    fn as_float_handles_commas_and_junk() {
        assert_eq!(as_float(Some(&t("12,5")), 0.0), 12.5);
        assert_eq!(as_float(Some(&t(" 8 ")), 0.0), 8.0);
        assert_eq!(as_float(Some(&t("DNP")), 0.0), 0.0);
        assert_eq!(as_float(Some(&Cell::Float(f64::NAN)), 0.0), 0.0);
        assert_eq!(as_float(Some(&Cell::Int(4)), 0.0), 4.0);
        assert_eq!(as_float(Some(&Cell::Empty), 0.0), 0.0);
    }

    #[test]
    fn norm_pos_defaults_to_guard() {
        assert_eq!(norm_pos(Some(&t(" center "))), Position::Center);
        assert_eq!(norm_pos(Some(&t("FORWARD"))), Position::Forward);
        assert_eq!(norm_pos(Some(&t("Guard/Forward"))), Position::Guard);
        assert_eq!(norm_pos(Some(&t("PG"))), Position::Guard);
        assert_eq!(norm_pos(None), Position::Guard);
    }

    #[test]
    fn as_name_rejects_blank_cells() {
        assert_eq!(as_name(Some(&t("  Luka  "))), Some("Luka".to_string()));
        assert_eq!(as_name(Some(&t("   "))), None);
        assert_eq!(as_name(Some(&Cell::Float(f64::NAN))), None);
        assert_eq!(as_name(None), None);
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("gUARD"), "Guard");
        assert_eq!(title_case("forward-center"), "Forward-Center");
    }
}
