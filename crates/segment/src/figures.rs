//! Figure and table inventory, and writing summaries back into the extract.
//!
//! Every element carrying `filePaths` (a rendered figure or table) becomes a
//! [`FigureRecord`] listing the text elements nested under its path. Summaries
//! produced for those files are merged into the records, and the edit step
//! replaces the element text with the summary while blanking the nested text
//! it was built from.

use crate::elements::StructuredDocument;
use protoqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Summary text recorded when summarization failed.
pub const SUMMARY_FAILED: &str = "Error generating summary.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureRecord {
    /// File paths joined with `", "`
    pub files: String,
    pub object_id: i64,
    /// Element path plus a trailing `/`
    pub general_path: String,
    pub specific_paths: Vec<String>,
    pub texts: Vec<String>,
    pub text_object_ids: Vec<i64>,
    pub summary: String,
}

impl FigureRecord {
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.files.split(", ").filter(|f| !f.is_empty())
    }

    /// Empty or failed summary.
    pub fn needs_summary(&self) -> bool {
        self.summary.trim().is_empty() || self.summary == SUMMARY_FAILED
    }

    fn push_summary(&mut self, summary: &str) {
        if self.needs_summary() {
            self.summary = summary.to_string();
        } else {
            self.summary.push('\n');
            self.summary.push_str(summary);
        }
    }
}

/// One record per distinct `filePaths` list, in first-seen order. A later
/// element with the same files replaces the path and object id.
pub fn build_inventory(document: &StructuredDocument) -> Vec<FigureRecord> {
    let mut records: Vec<FigureRecord> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();

    for element in &document.elements {
        let Some(files) = element.file_paths.as_ref() else {
            continue;
        };
        let general_path = format!("{}/", element.path);
        match index.get(files) {
            Some(&i) => {
                records[i].general_path = general_path;
                records[i].object_id = element.object_id;
            }
            None => {
                index.insert(files.clone(), records.len());
                records.push(FigureRecord {
                    files: files.join(", "),
                    object_id: element.object_id,
                    general_path,
                    ..FigureRecord::default()
                });
            }
        }
    }

    for record in &mut records {
        let prefix = record.general_path.as_str();
        for element in &document.elements {
            let nested = format!("{}/", element.path) == prefix
                || (element.path.starts_with(prefix) && element.path.len() > prefix.len());
            if !nested {
                continue;
            }
            if let Some(text) = element.text.as_ref() {
                record.texts.push(text.clone());
                record.text_object_ids.push(element.object_id);
                record.specific_paths.push(element.path.clone());
            }
        }
    }

    tracing::debug!(records = records.len(), "Built figure inventory");
    records
}

/// Merge `(file_name, summary)` pairs into every record whose files contain
/// the file name. Several matches append with a newline. With `only_missing`,
/// records that already hold a usable summary are left alone.
pub fn merge_summaries(
    records: &mut [FigureRecord],
    summaries: &[(String, String)],
    only_missing: bool,
) -> usize {
    let mut merged = 0;
    for (file_name, summary) in summaries {
        for record in records.iter_mut() {
            if only_missing && !record.needs_summary() {
                continue;
            }
            if record.file_list().any(|f| f.contains(file_name.as_str())) {
                record.push_summary(summary);
                merged += 1;
            }
        }
    }
    merged
}

/// Edit step: the element owning a record's files gets the record summary as
/// its text; text elements listed in the record's specific paths are blanked.
/// Returns the number of elements changed.
pub fn apply_summaries(document: &mut StructuredDocument, records: &[FigureRecord]) -> usize {
    let mut changed = 0;
    for record in records {
        for element in &mut document.elements {
            if element.object_id == record.object_id && element.file_paths.is_some() {
                tracing::debug!(object_id = element.object_id, "Replacing text with summary");
                element.text = Some(record.summary.clone());
                changed += 1;
            } else if element.file_paths.is_none()
                && record.specific_paths.iter().any(|p| *p == element.path)
            {
                element.text = Some(String::new());
                changed += 1;
            }
        }
    }
    changed
}

const INVENTORY_HEADERS: [&str; 7] = [
    "Files",
    "ObjectID_file",
    "General Paths",
    "Specific Paths",
    "Texts",
    "ObjectIDs_text",
    "Summaries",
];

/// Write the inventory as CSV; list columns hold JSON arrays.
pub fn write_inventory(path: &Path, records: &[FigureRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(INVENTORY_HEADERS)?;
    for record in records {
        writer.write_record([
            record.files.clone(),
            record.object_id.to_string(),
            record.general_path.clone(),
            serde_json::to_string(&record.specific_paths)?,
            serde_json::to_string(&record.texts)?,
            serde_json::to_string(&record.text_object_ids)?,
            record.summary.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_inventory(path: &Path) -> AppResult<Vec<FigureRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            AppError::Segment(format!("Inventory {:?} is missing column '{}'", path, name))
        })
    };
    let cols = INVENTORY_HEADERS
        .iter()
        .map(|name| column(*name))
        .collect::<AppResult<Vec<usize>>>()?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(cols[i]).unwrap_or_default();
        let list = |i: usize| -> AppResult<Vec<String>> {
            let raw = field(i);
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(serde_json::from_str(raw)?)
        };

        let object_id = field(1).trim().parse::<i64>().map_err(|e| {
            AppError::Segment(format!("Invalid ObjectID_file '{}': {}", field(1), e))
        })?;
        let text_object_ids = if field(5).trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(field(5))?
        };

        records.push(FigureRecord {
            files: field(0).to_string(),
            object_id,
            general_path: field(2).to_string(),
            specific_paths: list(3)?,
            texts: list(4)?,
            text_object_ids,
            summary: field(6).to_string(),
        });
    }
    Ok(records)
}
