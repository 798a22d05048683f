//! Text of sections promoted through `keepText`.

use crate::segmentation::{Section, TextEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionChunk {
    pub section_name: String,
    pub text: String,
}

/// One chunk per exception section that owns text. Entry texts are
/// concatenated as-is, without a separator.
pub fn collect_exception_chunks(
    texts: &[TextEntry],
    exception_sections: &[Section],
) -> Vec<ExceptionChunk> {
    exception_sections
        .iter()
        .filter_map(|section| {
            let owned: Vec<&str> = texts
                .iter()
                .filter(|t| t.section_id == section.section_id)
                .map(|t| t.text.as_str())
                .collect();
            (!owned.is_empty()).then(|| ExceptionChunk {
                section_name: section.section_name.clone(),
                text: owned.concat(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenates_without_separator_and_skips_empty() {
        let sections: Vec<Section> = [(1, "Key Recommendations"), (2, "Summary")]
            .iter()
            .map(|(id, name)| Section {
                section_id: *id,
                section_name: name.to_string(),
                path: "//Document/P".to_string(),
                page: 1,
                object_id: 0,
            })
            .collect();
        let texts: Vec<TextEntry> = [(1, 1, "Avoid imaging. "), (2, 1, "Reassess in 6 weeks."), (3, 3, "Other")]
            .iter()
            .map(|(id, section_id, body)| TextEntry {
                text_id: *id,
                section_id: *section_id,
                path: "//Document/P".to_string(),
                text: body.to_string(),
                page: 1,
                object_id: 0,
                add_element: None,
            })
            .collect();

        let chunks = collect_exception_chunks(&texts, &sections);
        assert_eq!(
            chunks,
            vec![ExceptionChunk {
                section_name: "Key Recommendations".to_string(),
                text: "Avoid imaging. Reassess in 6 weeks.".to_string(),
            }]
        );
    }
}
