//! Ordered pass over extract elements that rebuilds the section structure.
//!
//! Headings are recognised by path (`/H1` by default), the document title by
//! an exact path, and textless `Table`/`Figure` elements at document level are
//! recorded as assets. Everything else is body text attached to the most
//! recent section. The pass stops at the references heading.

use crate::elements::Element;
use once_cell::sync::Lazy;
use protoqa_core::SegmentationConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TABLE_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//Document/Table(?:\[\d+\])?$").expect("valid regex"));
static FIGURE_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//Document/Figure(?:\[\d+\])?$").expect("valid regex"));
static TABLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//Document/Table(\[\d+\])?/").expect("valid regex"));
static FIGURE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//Document/Figure(\[\d+\])?/").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title_id: usize,
    pub title_name: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "ObjectID")]
    pub object_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: usize,
    pub section_name: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "ObjectID")]
    pub object_id: i64,
}

/// Body text with the section it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    pub text_id: usize,
    /// 0 for text before the first heading
    pub section_id: usize,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "ObjectID")]
    pub object_id: i64,
    /// Enclosing `//Document/Table[n]/` or `//Document/Figure[n]/` prefix
    #[serde(rename = "Add_Element")]
    pub add_element: Option<String>,
}

/// A document-level table or figure without text of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: usize,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "filePaths")]
    pub file_paths: Option<Vec<String>>,
    #[serde(rename = "ObjectID")]
    pub object_id: i64,
}

/// Everything one pass collects. Ids are 1-based and dense per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub titles: Vec<TitleEntry>,
    pub tables: Vec<AssetEntry>,
    pub figures: Vec<AssetEntry>,
    pub texts: Vec<TextEntry>,
    pub sections: Vec<Section>,
    pub exception_sections: Vec<Section>,
    /// True when the pass ended at the references heading
    pub(crate) hit_references: bool,
}

impl Segmentation {
    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(|t| t.title_name.as_str())
    }
}

/// Table prefix wins over figure prefix when a path carries both.
fn enclosing_element(path: &str) -> Option<String> {
    TABLE_PREFIX
        .find(path)
        .or_else(|| FIGURE_PREFIX.find(path))
        .map(|m| m.as_str().to_string())
}

/// Walk `elements` in order and sort them into titles, sections, body text,
/// tables and figures.
pub fn segment(elements: &[Element], config: &SegmentationConfig) -> Segmentation {
    let mut out = Segmentation::default();

    for element in elements {
        let page = element.display_page();

        let Some(text) = element.text.as_deref() else {
            let path = element.path.as_str();
            let asset = |id| AssetEntry {
                id,
                path: element.path.clone(),
                page,
                file_paths: element.file_paths.clone(),
                object_id: element.object_id,
            };
            if path.contains("/Table") {
                if TABLE_ROOT.is_match(path) {
                    out.tables.push(asset(out.tables.len() + 1));
                }
            } else if path.contains("/Figure") && FIGURE_ROOT.is_match(path) {
                out.figures.push(asset(out.figures.len() + 1));
            }
            continue;
        };

        let trimmed = text.trim();

        if element.path == config.title_path {
            out.titles.push(TitleEntry {
                title_id: out.titles.len() + 1,
                title_name: text.to_string(),
                path: element.path.clone(),
                page,
                object_id: element.object_id,
            });
        } else if config.keep_text.iter().any(|k| k == trimmed) {
            let section = new_section(&out, element, text);
            tracing::debug!(
                section_id = section.section_id,
                object_id = element.object_id,
                "Promoted '{}' to a section",
                trimmed
            );
            out.exception_sections.push(section.clone());
            out.sections.push(section);
        } else if element.path.contains(&config.heading_marker)
            && !config.ignored_headings.iter().any(|h| h == trimmed)
        {
            if trimmed == config.reference_text {
                tracing::info!("Reached '{}' heading, stopping", config.reference_text);
                out.hit_references = true;
                return out;
            }
            let section = new_section(&out, element, text);
            out.sections.push(section);
        } else {
            out.texts.push(TextEntry {
                text_id: out.texts.len() + 1,
                section_id: out.sections.len(),
                path: element.path.clone(),
                text: text.to_string(),
                page,
                object_id: element.object_id,
                add_element: enclosing_element(&element.path),
            });
        }
    }

    out
}

fn new_section(out: &Segmentation, element: &Element, text: &str) -> Section {
    Section {
        section_id: out.sections.len() + 1,
        section_name: text.to_string(),
        path: element.path.clone(),
        page: element.display_page(),
        object_id: element.object_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(path: &str, text: Option<&str>, page: u32, id: i64) -> Element {
        Element::new(path, text, page, id)
    }

    #[test]
    fn test_headings_title_and_body() {
        let elements = vec![
            el("//Document/Figure", Some("When to order MRI"), 0, 1),
            el("//Document/P", Some("Preamble"), 0, 2),
            el("//Document/H1", Some("Overview"), 0, 3),
            el("//Document/P[2]", Some("Body one"), 1, 4),
            el("//Document/H1[2]", Some("Assessment"), 2, 5),
            el("//Document/L/LI/LBody", Some("Body two"), 2, 6),
        ];

        let seg = segment(&elements, &SegmentationConfig::default());

        assert_eq!(seg.title(), Some("When to order MRI"));
        assert_eq!(seg.titles[0].page, 1);
        let names: Vec<_> = seg.sections.iter().map(|s| s.section_name.as_str()).collect();
        assert_eq!(names, vec!["Overview", "Assessment"]);

        let owners: Vec<_> = seg.texts.iter().map(|t| (t.text_id, t.section_id)).collect();
        assert_eq!(owners, vec![(1, 0), (2, 1), (3, 2)]);
        assert_eq!(seg.texts[1].page, 2);
        assert!(!seg.hit_references);
    }

    #[test]
    fn test_stops_at_references() {
        let elements = vec![
            el("//Document/H1", Some("Overview"), 0, 1),
            el("//Document/P", Some("Kept"), 0, 2),
            el("//Document/H1[2]", Some(" References "), 3, 3),
            el("//Document/P[2]", Some("Dropped"), 3, 4),
            el("//Document/H1[3]", Some("Appendix"), 4, 5),
        ];

        let seg = segment(&elements, &SegmentationConfig::default());
        assert!(seg.hit_references);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.texts.len(), 1);
        assert_eq!(seg.texts[0].text, "Kept");
    }

    #[test]
    fn test_ignored_heading_is_body_text() {
        let elements = vec![
            el("//Document/H1", Some("Overview"), 0, 1),
            el("//Document/H1[2]", Some("www.ace-hta.gov.sg"), 0, 2),
        ];
        let seg = segment(&elements, &SegmentationConfig::default());
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.texts[0].text, "www.ace-hta.gov.sg");
        assert_eq!(seg.texts[0].section_id, 1);
    }

    #[test]
    fn test_keep_text_becomes_exception_section() {
        let config = SegmentationConfig {
            keep_text: vec!["Key Recommendations".to_string()],
            ..SegmentationConfig::default()
        };
        let elements = vec![
            el("//Document/P", Some(" Key Recommendations "), 0, 1),
            el("//Document/P[2]", Some("Avoid imaging"), 0, 2),
        ];

        let seg = segment(&elements, &config);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.exception_sections, seg.sections);
        assert_eq!(seg.sections[0].section_name, " Key Recommendations ");
        assert_eq!(seg.texts[0].section_id, 1);
    }

    #[test]
    fn test_tables_and_figures_without_text() {
        let elements = vec![
            el("//Document/Table", None, 0, 1).with_files(["tables/fileoutpart1.xlsx"]),
            el("//Document/Table[2]/TR/TD", None, 0, 2),
            el("//Document/Figure[3]", None, 1, 3).with_files(["figures/fileoutpart2.png"]),
            el("//Document/Sect/Figure", None, 1, 4),
            el("//Document/Table[4]", None, 2, 5),
        ];

        let seg = segment(&elements, &SegmentationConfig::default());
        let tables: Vec<_> = seg.tables.iter().map(|t| (t.id, t.object_id)).collect();
        assert_eq!(tables, vec![(1, 1), (2, 5)]);
        assert_eq!(seg.tables[0].file_paths.as_ref().map(Vec::len), Some(1));
        assert_eq!(seg.figures.len(), 1);
        assert_eq!(seg.figures[0].page, 2);
        assert!(seg.texts.is_empty());
    }

    #[test]
    fn test_add_element_prefix() {
        assert_eq!(
            enclosing_element("//Document/Table[2]/TR/TD/P"),
            Some("//Document/Table[2]/".to_string())
        );
        assert_eq!(
            enclosing_element("//Document/Figure/Caption"),
            Some("//Document/Figure/".to_string())
        );
        assert_eq!(enclosing_element("//Document/P"), None);
        assert_eq!(
            enclosing_element("//Document/Figure[1]/Table[2]/TD"),
            Some("//Document/Figure[1]/".to_string())
        );
    }
}
