use std::path::Path;

use anyhow::{Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};

use crate::columns::NAME_LABELS;

/// Number of leading rows searched for the header row.
pub const HEADER_SCAN_ROWS: usize = 10;

/// Label prefix given to header cells that are blank.
pub const PLACEHOLDER_PREFIX: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// True for blank cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Display form used for header labels and names.
    pub fn to_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f:.1}"),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(n) => Cell::Int(*n),
            Data::Float(f) => Cell::Float(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) => Cell::Float(dt.as_f64()),
            Data::Error(_) => Cell::Empty,
        }
    }
}

/// A worksheet as a headerless grid. Row 0 is the first spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// A sheet re-read with a chosen header row: labelled columns and data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header_row: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Index of the first column whose lowercased, trimmed label equals `label`.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        let wanted = label.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.trim().to_lowercase() == wanted)
    }

    pub fn has_name_column(&self) -> bool {
        self.columns
            .iter()
            .any(|c| NAME_LABELS.contains(&clean_header(c).as_str()))
    }
}

pub fn clean_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Reads every worksheet in workbook order.
pub fn read_workbook(path: &Path) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| anyhow!("failed to read workbook {}: {err}", path.display()))?;
    let mut out = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| anyhow!("failed to read sheet '{name}': {err}"))?;
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }
        out.push(RawSheet::new(name, rows));
    }
    Ok(out)
}

/// First row within the scan window holding a recognised name label, else row 0.
pub fn find_header_row(sheet: &RawSheet) -> usize {
    sheet
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            row.iter()
                .any(|cell| NAME_LABELS.contains(&clean_header(&cell.to_label()).as_str()))
        })
        .unwrap_or(0)
}

/// Applies `header_row` as column labels and drops placeholder columns.
pub fn apply_header(sheet: &RawSheet, header_row: usize) -> Table {
    let header = sheet.rows.get(header_row).cloned().unwrap_or_default();
    let width = sheet
        .rows
        .iter()
        .skip(header_row)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    let labels = (0..width)
        .map(|idx| match header.get(idx) {
            Some(cell) if !cell.is_blank() => cell.to_label(),
            _ => format!("{PLACEHOLDER_PREFIX}: {idx}"),
        })
        .collect::<Vec<_>>();

    let keep = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| !label.starts_with(PLACEHOLDER_PREFIX))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    let columns = keep.iter().map(|&idx| labels[idx].clone()).collect();
    let rows = sheet
        .rows
        .iter()
        .skip(header_row + 1)
        .filter(|row| !row.iter().all(Cell::is_blank))
        .map(|row| {
            keep.iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();

    Table {
        header_row,
        columns,
        rows,
    }
}
