//! Per-section chunks built from segmented body text.

use crate::segmentation::{Section, TextEntry};
use crate::splitter::RecursiveCharacterSplitter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One unit of text handed to question generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionChunk {
    pub text_chunk: String,
    pub section_name: Option<String>,
    /// Every text entry of the section, even when the section was split
    pub text_id: Vec<usize>,
    /// Distinct 1-based pages, ascending
    pub pages: Vec<u32>,
}

#[derive(Default)]
struct SectionText {
    text: String,
    ids: Vec<usize>,
    pages: BTreeSet<u32>,
}

/// Join entry text per section with a blank line and emit one chunk per
/// section, in section order. Sections longer than the splitter's chunk size
/// yield one chunk per split piece. Text before the first section is dropped.
pub fn group_sections(
    texts: &[TextEntry],
    sections: &[Section],
    splitter: &RecursiveCharacterSplitter,
) -> Vec<SectionChunk> {
    let mut grouped: HashMap<usize, SectionText> = HashMap::new();
    for entry in texts {
        let group = grouped.entry(entry.section_id).or_default();
        if !group.text.is_empty() {
            group.text.push_str("\n\n");
        }
        group.text.push_str(&entry.text);
        group.ids.push(entry.text_id);
        group.pages.insert(entry.page);
    }

    let empty = SectionText::default();
    let mut chunks = Vec::new();

    for section in sections {
        let group = grouped.get(&section.section_id).unwrap_or(&empty);
        let pages: Vec<u32> = group.pages.iter().copied().collect();
        let make = |text_chunk: String| SectionChunk {
            text_chunk,
            section_name: Some(section.section_name.clone()),
            text_id: group.ids.clone(),
            pages: pages.clone(),
        };

        if group.text.chars().count() > splitter.chunk_size() {
            let pieces = splitter.split_text(&group.text);
            tracing::debug!(
                section_id = section.section_id,
                pieces = pieces.len(),
                "Split oversize section '{}'",
                section.section_name.trim()
            );
            chunks.extend(pieces.into_iter().map(make));
        } else {
            chunks.push(make(group.text.clone()));
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: usize, name: &str) -> Section {
        Section {
            section_id: id,
            section_name: name.to_string(),
            path: "//Document/H1".to_string(),
            page: 1,
            object_id: id as i64,
        }
    }

    fn text(id: usize, section_id: usize, body: &str, page: u32) -> TextEntry {
        TextEntry {
            text_id: id,
            section_id,
            path: "//Document/P".to_string(),
            text: body.to_string(),
            page,
            object_id: 100 + id as i64,
            add_element: None,
        }
    }

    #[test]
    fn test_one_chunk_per_section_including_empty() {
        let sections = vec![section(1, "Overview"), section(2, "Empty"), section(3, "Plan")];
        let texts = vec![
            text(1, 0, "before any heading", 1),
            text(2, 1, "first", 3),
            text(3, 1, "second", 2),
            text(4, 1, "third", 3),
            text(5, 3, "plan text", 4),
        ];
        let splitter = RecursiveCharacterSplitter::new(3000, 100).unwrap();

        let chunks = group_sections(&texts, &sections, &splitter);
        assert_eq!(chunks.len(), 3);

        assert_eq!(chunks[0].text_chunk, "first\n\nsecond\n\nthird");
        assert_eq!(chunks[0].text_id, vec![2, 3, 4]);
        assert_eq!(chunks[0].pages, vec![2, 3]);

        assert_eq!(chunks[1].section_name.as_deref(), Some("Empty"));
        assert_eq!(chunks[1].text_chunk, "");
        assert!(chunks[1].text_id.is_empty());
        assert!(chunks[1].pages.is_empty());

        assert!(chunks.iter().all(|c| !c.text_chunk.contains("before any heading")));
    }

    #[test]
    fn test_oversize_section_is_split() {
        let sections = vec![section(1, "Long")];
        let texts = vec![
            text(1, 1, "alpha beta gamma", 1),
            text(2, 1, "delta epsilon zeta", 2),
        ];
        let splitter = RecursiveCharacterSplitter::new(20, 0).unwrap();

        let chunks = group_sections(&texts, &sections, &splitter);
        let bodies: Vec<_> = chunks.iter().map(|c| c.text_chunk.as_str()).collect();
        assert_eq!(bodies, vec!["alpha beta gamma", "delta epsilon zeta"]);
        for chunk in &chunks {
            assert_eq!(chunk.section_name.as_deref(), Some("Long"));
            assert_eq!(chunk.text_id, vec![1, 2]);
            assert_eq!(chunk.pages, vec![1, 2]);
        }
    }

    #[test]
    fn test_exact_budget_is_not_split() {
        let body = "x".repeat(20);
        let chunks = group_sections(
            &[text(1, 1, &body, 1)],
            &[section(1, "Exact")],
            &RecursiveCharacterSplitter::new(20, 0).unwrap(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text_chunk, body);
    }
}
