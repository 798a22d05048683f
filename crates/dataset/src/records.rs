//! Question-answer records and their CSV form.

use protoqa_core::{AppError, AppResult};
use std::path::Path;

/// One generated question-answer pair with its provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QaRecord {
    pub id: usize,
    pub question: String,
    pub answer: String,
    /// Raw model response the pair was extracted from
    pub full_text: String,
    pub reference: String,
    pub section: String,
    pub pages: Vec<u32>,
    /// Source chunk the pair was generated from
    pub doc_chunk: String,
    pub title: String,
    pub flag_source: bool,
    /// Reference answer, when a reviewer supplied one
    pub ground_truth: Option<String>,
}

pub(crate) const RECORD_HEADERS: [&str; 11] = [
    "id",
    "question",
    "answer",
    "full_text",
    "reference",
    "section",
    "pages",
    "doc_chunk",
    "title",
    "flag_source",
    "ground_truth",
];

impl QaRecord {
    pub(crate) fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.question.clone(),
            self.answer.clone(),
            self.full_text.clone(),
            self.reference.clone(),
            self.section.clone(),
            format_pages(&self.pages),
            self.doc_chunk.clone(),
            self.title.clone(),
            u8::from(self.flag_source).to_string(),
            self.ground_truth.clone().unwrap_or_default(),
        ]
    }
}

/// `[1, 2]`, the way page lists appear in references.
pub fn format_pages(pages: &[u32]) -> String {
    let joined: Vec<String> = pages.iter().map(u32::to_string).collect();
    format!("[{}]", joined.join(", "))
}

pub fn parse_pages(raw: &str) -> AppResult<Vec<u32>> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u32>()
                .map_err(|e| AppError::Dataset(format!("Invalid page '{}': {}", p, e)))
        })
        .collect()
}

pub(crate) fn create_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Overwrite `path` with all records.
pub fn write_records(path: &Path, records: &[QaRecord]) -> AppResult<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(RECORD_HEADERS)?;
    for record in records {
        writer.write_record(record.to_fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read records written by [`write_records`]. Only `question`, `answer` and
/// `doc_chunk` are required; other columns default when absent.
pub fn read_records(path: &Path) -> AppResult<Vec<QaRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    for required in ["question", "answer", "doc_chunk"] {
        if position(required).is_none() {
            return Err(AppError::Dataset(format!(
                "{:?} is missing column '{}'",
                path, required
            )));
        }
    }
    let cols: Vec<Option<usize>> = RECORD_HEADERS.iter().map(|h| position(*h)).collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let field = |i: usize| cols[i].and_then(|c| row.get(c)).unwrap_or_default();

        let id = match field(0).trim() {
            "" => index + 1,
            raw => raw
                .parse()
                .map_err(|e| AppError::Dataset(format!("Invalid id '{}': {}", raw, e)))?,
        };
        let flag_source = matches!(field(9).trim(), "1" | "true" | "True");
        let ground_truth = Some(field(10).trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string);

        records.push(QaRecord {
            id,
            question: field(1).to_string(),
            answer: field(2).to_string(),
            full_text: field(3).to_string(),
            reference: field(4).to_string(),
            section: field(5).to_string(),
            pages: parse_pages(field(6))?,
            doc_chunk: field(7).to_string(),
            title: field(8).to_string(),
            flag_source,
            ground_truth,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pages() {
        assert_eq!(format_pages(&[3, 4]), "[3, 4]");
        assert_eq!(format_pages(&[]), "[]");
        assert_eq!(parse_pages("[3, 4]").unwrap(), vec![3, 4]);
        assert!(parse_pages("[]").unwrap().is_empty());
        assert!(parse_pages("[three]").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qa/QA_tmp.csv");
        let records = vec![QaRecord {
            id: 1,
            question: "When is MRI indicated?".to_string(),
            answer: "When red flags are present, e.g. \"cauda equina\".".to_string(),
            full_text: "**Question 1:** ...".to_string(),
            reference: "For more information, refer to clinical protocol LBP, Section Imaging, Pages [2]".to_string(),
            section: "Imaging".to_string(),
            pages: vec![2],
            doc_chunk: "Line one\nline two".to_string(),
            title: "LBP".to_string(),
            flag_source: true,
            ground_truth: None,
        }];

        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_read_minimal_columns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reviewed.csv");
        std::fs::write(
            &path,
            "question,answer,doc_chunk,ground_truth\nQ1,A1,C1,G1\nQ2,A2,C2,\n",
        )
        .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[0].ground_truth.as_deref(), Some("G1"));
        assert_eq!(records[1].ground_truth, None);
        assert!(records[0].pages.is_empty());
        assert!(!records[0].flag_source);
    }

    #[test]
    fn test_missing_required_column() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.csv");
        std::fs::write(&path, "question,answer\nQ,A\n").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(err.to_string().contains("doc_chunk"));
    }
}
