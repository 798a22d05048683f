//! Data model of a PDF structured-data extract.

use protoqa_core::{AppError, AppResult, Replacement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// One extracted object (heading, paragraph, table cell, figure, ...).
///
/// Keys the pipeline does not interpret are kept in `extra` so an edited
/// document can be written back without losing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Hierarchical location, e.g. `//Document/Table[2]/TR/TD/P`
    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// 0-based page index
    #[serde(rename = "Page", default)]
    pub page: u32,

    #[serde(rename = "ObjectID", default)]
    pub object_id: i64,

    /// Rendered files (images, table spreadsheets) for figure and table elements
    #[serde(rename = "filePaths", default, skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn new(path: impl Into<String>, text: Option<&str>, page: u32, object_id: i64) -> Self {
        Self {
            path: path.into(),
            text: text.map(str::to_string),
            page,
            object_id,
            file_paths: None,
            extra: Map::new(),
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_paths = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// `Page + 1`, the page number a reader sees.
    pub fn display_page(&self) -> u32 {
        self.page.saturating_add(1)
    }
}

/// A whole extract: the `elements` list plus any other top-level keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub elements: Vec<Element>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredDocument {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            extra: Map::new(),
        }
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Segment(format!("Failed to read structured data {:?}: {}", path, e))
        })?;
        let document: Self = serde_json::from_str(&contents).map_err(|e| {
            AppError::Segment(format!("Invalid structured data {:?}: {}", path, e))
        })?;
        tracing::debug!(
            elements = document.elements.len(),
            "Loaded structured data from {:?}",
            path
        );
        Ok(document)
    }

    /// Write the document as pretty JSON; absent fields are omitted.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `table` to the text of every element.
    pub fn replace_text(&mut self, table: &[Replacement]) {
        for element in &mut self.elements {
            if let Some(text) = element.text.as_mut() {
                *text = apply_replacements(text, table);
            }
        }
    }
}

/// Literal substring replacement, applied in table order.
pub fn apply_replacements(text: &str, table: &[Replacement]) -> String {
    table
        .iter()
        .filter(|r| !r.from.is_empty())
        .fold(text.to_string(), |acc, r| acc.replace(&r.from, &r.to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "version": {"json_export": "1.4"},
        "elements": [
            {"Path": "//Document/H1", "Text": "Introduction ", "Page": 0, "ObjectID": 7, "Font": {"size": 14}},
            {"Path": "//Document/Figure", "Page": 1, "ObjectID": 9, "filePaths": ["figures/fileoutpart0.png"]}
        ]
    }"#;

    #[test]
    fn test_parse_and_preserve_unknown_keys() {
        let doc: StructuredDocument = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(doc.elements.len(), 2);

        let heading = &doc.elements[0];
        assert_eq!(heading.path, "//Document/H1");
        assert_eq!(heading.text.as_deref(), Some("Introduction "));
        assert_eq!(heading.display_page(), 1);
        assert!(heading.extra.contains_key("Font"));

        let figure = &doc.elements[1];
        assert!(figure.text.is_none());
        assert_eq!(
            figure.file_paths.as_deref(),
            Some(&["figures/fileoutpart0.png".to_string()][..])
        );
        assert!(doc.extra.contains_key("version"));
    }

    #[test]
    fn test_display_page_saturates() {
        assert_eq!(Element::new("//Document/P", None, 4, 1).display_page(), 5);
        assert_eq!(Element::new("//Document/P", None, u32::MAX, 1).display_page(), u32::MAX);
    }

    #[test]
    fn test_save_round_trip_omits_missing_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/structuredData_edited.json");

        let doc: StructuredDocument = serde_json::from_str(SAMPLE).unwrap();
        doc.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("null"));
        assert_eq!(StructuredDocument::load(&path).unwrap(), doc);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{\"elements\": [").unwrap();
        let err = StructuredDocument::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid structured data"));
    }

    #[test]
    fn test_replacements_in_order() {
        let table = vec![
            Replacement::new("≥", "more than or equals to"),
            Replacement::new("more", "MORE"),
        ];
        assert_eq!(apply_replacements("eGFR ≥ 60", &table), "eGFR MORE than or equals to 60");
        assert_eq!(apply_replacements("unchanged", &[]), "unchanged");
    }

    #[test]
    fn test_replace_text_skips_textless_elements() {
        let mut doc = StructuredDocument::new(vec![
            Element::new("//Document/P", Some("BMI ≤ 23"), 0, 1),
            Element::new("//Document/Figure", None, 0, 2),
        ]);
        doc.replace_text(&[Replacement::new("≤", "less than or equals to")]);
        assert_eq!(doc.elements[0].text.as_deref(), Some("BMI less than or equals to 23"));
        assert!(doc.elements[1].text.is_none());
    }
}
