//! Destination reference table.
//!
//! Reads the first sheet of a workbook (`.xlsx`, `.xls`, `.ods`) or a `.csv`
//! file. Only the `Region`, `Country` and `Country Code` columns are kept,
//! and rows missing any of the three are dropped.

use calamine::{Data, Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tripcover_core::error::CorpusError;

pub const REGION_COLUMN: &str = "Region";
pub const COUNTRY_COLUMN: &str = "Country";
pub const COUNTRY_CODE_COLUMN: &str = "Country Code";

/// Heading placed above the rendered table in the assembled context.
pub const DESTINATION_LIST_HEADING: &str = "Here is the list of travel destinations supported:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRow {
    pub region: String,
    pub country: String,
    pub country_code: String,
}

/// Static destination data, loaded once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTable {
    rows: Vec<DestinationRow>,
}

impl DestinationTable {
    /// Load a table from disk, picking the reader by extension.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        let (headers, records) = if is_csv {
            read_csv(path)?
        } else {
            read_workbook(path)?
        };

        Self::from_records(&path.display().to_string(), &headers, records)
    }

    /// Build a table from a header row and raw records.
    pub fn from_records<I>(source: &str, headers: &[String], records: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CorpusError::MissingColumn {
                    path: source.to_string(),
                    column: name.to_string(),
                })
        };
        let region_idx = column(REGION_COLUMN)?;
        let country_idx = column(COUNTRY_COLUMN)?;
        let code_idx = column(COUNTRY_CODE_COLUMN)?;

        let cell = |record: &[String], idx: usize| {
            record
                .get(idx)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let rows = records
            .into_iter()
            .filter_map(|record| {
                Some(DestinationRow {
                    region: cell(&record, region_idx)?,
                    country: cell(&record, country_idx)?,
                    country_code: cell(&record, code_idx)?,
                })
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[DestinationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fixed-width rendering, right-aligned columns, no row indices.
    pub fn render(&self) -> String {
        let headers = [REGION_COLUMN, COUNTRY_COLUMN, COUNTRY_CODE_COLUMN];
        let mut widths = headers.map(|h| h.chars().count());
        for row in &self.rows {
            for (w, value) in widths.iter_mut().zip(row.cells()) {
                *w = (*w).max(value.chars().count());
            }
        }

        let line = |cells: [&str; 3]| {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(c, w)| format!("{c:>w$}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut lines = vec![line(headers)];
        lines.extend(self.rows.iter().map(|row| line(row.cells())));
        lines.join("\n")
    }

    /// The destination list as it appears in the assembled context.
    pub fn to_context_text(&self) -> String {
        format!("{DESTINATION_LIST_HEADING}\n{}", self.render())
    }
}

impl DestinationRow {
    fn cells(&self) -> [&str; 3] {
        [&self.region, &self.country, &self.country_code]
    }
}

type RawTable = (Vec<String>, Vec<Vec<String>>);

fn read_workbook(path: &Path) -> Result<RawTable, CorpusError> {
    let unreadable = |reason: String| CorpusError::Unreadable {
        path: path.display().to_string(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable("workbook has no sheets".into()))?
        .map_err(|e| unreadable(e.to_string()))?;

    let mut rows = range.rows().map(|r| r.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok((headers, rows.collect()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn read_csv(path: &Path) -> Result<RawTable, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let headers = lines.next().map(split_csv_line).unwrap_or_default();
    Ok((headers, lines.map(split_csv_line).collect()))
}

/// Split one CSV line, honouring double-quoted fields and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => result.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    result.push(current);
    result
}
