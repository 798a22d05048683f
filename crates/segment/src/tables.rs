//! Table files (CSV or spreadsheet) rendered as row-by-row prose.

use calamine::{open_workbook_auto, Reader};
use protoqa_core::{AppError, AppResult};
use std::path::Path;

/// A header row plus data rows, all cells as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Load the first sheet of a spreadsheet, or a CSV file.
pub fn load_table(path: &Path) -> AppResult<Table> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        other => Err(AppError::Segment(format!(
            "Unsupported table file type '{}': {:?}",
            other, path
        ))),
    }
}

fn load_csv(path: &Path) -> AppResult<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

fn load_spreadsheet(path: &Path) -> AppResult<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::Segment(format!("Failed to open spreadsheet {:?}: {}", path, e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Segment(format!("Spreadsheet {:?} has no sheets", path)))?
        .map_err(|e| AppError::Segment(format!("Failed to read spreadsheet {:?}: {}", path, e)))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(Table {
        headers,
        rows: rows.collect(),
    })
}

impl Table {
    pub fn describe(&self) -> String {
        describe_table(&self.headers, &self.rows)
    }
}

/// Render each row as `In row N, The <column> is: <value>. ...`, one line per
/// row. Empty cells are skipped; line breaks inside cells become spaces.
pub fn describe_table(headers: &[String], rows: &[Vec<String>]) -> String {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let cells: Vec<String> = headers
                .iter()
                .zip(row)
                .filter_map(|(column, value)| {
                    let value = value.trim().replace('\n', " ").replace('\r', "");
                    (!value.is_empty()).then(|| format!("The {} is: {}.", column.trim(), value))
                })
                .collect();
            if cells.is_empty() {
                format!("In row {},", index + 1)
            } else {
                format!("In row {}, {}", index + 1, cells.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
