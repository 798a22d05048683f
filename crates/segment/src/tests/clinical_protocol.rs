//! A small guideline extract taken through summary editing and chunking.

use crate::elements::{Element, StructuredDocument};
use crate::exceptions::ExceptionChunk;
use crate::figures::{apply_summaries, build_inventory, merge_summaries};
use crate::grouping::SectionChunk;
use crate::pipeline::process_tree;
use protoqa_core::SegmentationConfig;
use tempfile::TempDir;

fn extract() -> StructuredDocument {
    StructuredDocument::new(vec![
        Element::new("//Document/Figure", Some("Management of Gout"), 0, 1),
        Element::new("//Document/P", Some("Key Recommendations"), 0, 2),
        Element::new("//Document/L/LI", Some("Treat acute flares early."), 0, 3),
        Element::new("//Document/H1", Some("Diagnosis"), 1, 4),
        Element::new(
            "//Document/P[2]",
            Some("Serum urate ≥ 360 µmol/L supports the diagnosis."),
            1,
            5,
        ),
        Element::new("//Document/Figure[2]", None, 1, 6).with_files(["figures/fileoutpart0.png"]),
        Element::new("//Document/Figure[2]/P", Some("Joint aspiration"), 1, 7),
        Element::new("//Document/H1[3]", Some("Treatment"), 2, 9),
        Element::new("//Document/Table", None, 2, 10).with_files(["tables/fileoutpart1.xlsx"]),
        Element::new("//Document/Table/TR/TD", Some("Colchicine"), 2, 11),
        Element::new("//Document/H1[4]", Some("References"), 3, 12),
        Element::new("//Document/P[3]", Some("Smith et al."), 3, 13),
    ])
}

#[test]
fn test_summaries_then_chunking() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let config = SegmentationConfig {
        keep_text: vec!["Key Recommendations".to_string()],
        ..SegmentationConfig::default()
    };

    let mut document = extract();
    let mut records = build_inventory(&document);
    assert_eq!(records.len(), 2);

    let summaries = vec![
        (
            "fileoutpart0.png".to_string(),
            "Flow chart: aspirate the joint.".to_string(),
        ),
        (
            "fileoutpart1".to_string(),
            "In row 1, The Drug is: Colchicine.".to_string(),
        ),
    ];
    assert_eq!(merge_summaries(&mut records, &summaries, false), 2);
    assert_eq!(apply_summaries(&mut document, &records), 4);

    let folder = input.path().join("Gout");
    document.save(&folder.join(&config.target_file)).unwrap();

    let summary = process_tree(input.path(), output.path(), &config, None).unwrap();
    assert_eq!(summary.processed, vec!["Gout"]);

    let out = output.path().join("Gout");
    let chunks: Vec<SectionChunk> =
        serde_json::from_str(&std::fs::read_to_string(out.join("final_chunks.json")).unwrap())
            .unwrap();
    let names: Vec<_> = chunks.iter().filter_map(|c| c.section_name.as_deref()).collect();
    assert_eq!(names, vec!["Key Recommendations", "Diagnosis", "Treatment"]);

    assert_eq!(chunks[0].text_chunk, "Treat acute flares early.");
    assert_eq!(chunks[0].pages, vec![1]);

    assert!(chunks[1]
        .text_chunk
        .starts_with("Serum urate more than or equals to 360 µmol/L supports the diagnosis.\n\nFlow chart: aspirate the joint."));
    assert!(!chunks[1].text_chunk.contains("Joint aspiration"));
    assert_eq!(chunks[1].text_id, vec![2, 3, 4]);
    assert_eq!(chunks[1].pages, vec![2]);

    assert!(chunks[2].text_chunk.starts_with("In row 1, The Drug is: Colchicine."));
    assert_eq!(chunks[2].pages, vec![3]);
    assert!(chunks.iter().all(|c| !c.text_chunk.contains("Smith")));

    let exceptions: Vec<ExceptionChunk> = serde_json::from_str(
        &std::fs::read_to_string(out.join("exception_chunks.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].text, "Treat acute flares early.");

    // summarised assets carry text now, so they are no longer listed as assets
    assert_eq!(std::fs::read_to_string(out.join("tables.json")).unwrap(), "[]");

    let mut reader = csv::Reader::from_path(out.join("Gout.csv")).unwrap();
    let titles: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[4].to_string())
        .collect();
    assert_eq!(titles, vec!["Management of Gout"; 3]);
}
