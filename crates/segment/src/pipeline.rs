//! Per-document and per-tree chunking with file outputs.

use crate::elements::StructuredDocument;
use crate::exceptions::{collect_exception_chunks, ExceptionChunk};
use crate::grouping::{group_sections, SectionChunk};
use crate::segmentation::{segment, Segmentation};
use crate::splitter::RecursiveCharacterSplitter;
use protoqa_core::{AppError, AppResult, SegmentationConfig};
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Everything produced for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentChunks {
    pub segmentation: Segmentation,
    pub exception_chunks: Vec<ExceptionChunk>,
    pub chunks: Vec<SectionChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Replace special characters, segment, collect exception chunks and group
/// sections. The input document is left untouched.
pub fn combine(
    document: &StructuredDocument,
    config: &SegmentationConfig,
) -> AppResult<DocumentChunks> {
    let splitter = RecursiveCharacterSplitter::new(config.max_chunk_chars, config.chunk_overlap)?;

    let mut document = document.clone();
    document.replace_text(&config.replacements);

    let segmentation = segment(&document.elements, config);
    let exception_chunks =
        collect_exception_chunks(&segmentation.texts, &segmentation.exception_sections);
    let chunks = group_sections(&segmentation.texts, &segmentation.sections, &splitter);

    tracing::info!(
        sections = segmentation.sections.len(),
        texts = segmentation.texts.len(),
        tables = segmentation.tables.len(),
        figures = segmentation.figures.len(),
        chunks = chunks.len(),
        stopped_at_references = segmentation.hit_references,
        "Segmented document"
    );

    Ok(DocumentChunks {
        segmentation,
        exception_chunks,
        chunks,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Write the intermediate JSON files and `<document_name>.csv` into `dir`.
pub fn write_outputs(dir: &Path, document_name: &str, chunks: &DocumentChunks) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;
    let seg = &chunks.segmentation;

    write_json(&dir.join("tables.json"), &seg.tables)?;
    write_json(&dir.join("figures.json"), &seg.figures)?;
    write_json(&dir.join("exception_chunks.json"), &chunks.exception_chunks)?;
    write_json(&dir.join("text_chunks.json"), &seg.texts)?;
    write_json(&dir.join("sections.json"), &seg.sections)?;
    write_json(&dir.join("final_chunks.json"), &chunks.chunks)?;

    let title = match seg.title() {
        Some(title) => title,
        None => {
            tracing::warn!("No title found in '{}', title column left empty", document_name);
            ""
        }
    };

    let csv_path = dir.join(format!("{}.csv", document_name));
    let mut writer = csv::Writer::from_path(&csv_path)?;
    writer.write_record(["text_chunk", "section_name", "text_id", "pages", "title"])?;
    for chunk in &chunks.chunks {
        let Some(section_name) = chunk.section_name.as_deref() else {
            continue;
        };
        let text_ids = serde_json::to_string(&chunk.text_id)?;
        let pages = serde_json::to_string(&chunk.pages)?;
        writer.write_record([
            chunk.text_chunk.as_str(),
            section_name,
            text_ids.as_str(),
            pages.as_str(),
            title,
        ])?;
    }
    writer.flush()?;

    tracing::debug!("Wrote chunk outputs to {:?}", dir);
    Ok(())
}

/// Chunk every immediate subfolder of `input_root` that holds the target file,
/// writing outputs to `output_root/<folder>`. `filter` restricts the run to
/// one folder name.
pub fn process_tree(
    input_root: &Path,
    output_root: &Path,
    config: &SegmentationConfig,
    filter: Option<&str>,
) -> AppResult<TreeSummary> {
    if !input_root.is_dir() {
        return Err(AppError::Segment(format!(
            "Input root {:?} is not a directory",
            input_root
        )));
    }

    let mut summary = TreeSummary::default();

    for entry in WalkDir::new(input_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().to_string();
        if filter.is_some_and(|f| f != folder) {
            continue;
        }

        let target = entry.path().join(&config.target_file);
        if !target.is_file() {
            tracing::info!("No {} in '{}', skipping folder", config.target_file, folder);
            summary.skipped.push(folder);
            continue;
        }

        let _span = tracing::info_span!("document", name = %folder).entered();
        let document = StructuredDocument::load(&target)?;
        let chunks = combine(&document, config)?;
        write_outputs(&output_root.join(&folder), &folder, &chunks)?;
        tracing::info!("Processed '{}'", folder);
        summary.processed.push(folder);
    }

    Ok(summary)
}
