//! Section segmentation for PDF-extracted structured documents.
//!
//! The extract is a flat list of elements, each tagged with a hierarchical
//! path such as `//Document/H1[3]` or `//Document/Table[2]/TR/TD/P`. This
//! crate rebuilds the section structure from those paths in a single ordered
//! pass, groups body text per section, and re-splits oversize sections into
//! overlapping chunks ready for question generation.
//!
//! # Modules
//! - [`elements`]: the extract data model
//! - [`segmentation`]: the ordered pass over elements
//! - [`grouping`]: per-section chunks
//! - [`exceptions`]: text of sections promoted through `keepText`
//! - [`splitter`]: recursive character-boundary splitter
//! - [`pipeline`]: per-document and per-tree processing with file outputs
//! - [`figures`]: figure/table inventory and summary editing
//! - [`tables`]: table files rendered as prose

pub mod elements;
pub mod exceptions;
pub mod figures;
pub mod grouping;
pub mod pipeline;
pub mod segmentation;
pub mod splitter;
pub mod tables;

#[cfg(test)]
mod tests;

pub use elements::{apply_replacements, Element, StructuredDocument};
pub use exceptions::{collect_exception_chunks, ExceptionChunk};
pub use figures::{
    apply_summaries, build_inventory, merge_summaries, read_inventory, write_inventory,
    FigureRecord, SUMMARY_FAILED,
};
pub use grouping::{group_sections, SectionChunk};
pub use pipeline::{combine, process_tree, write_outputs, DocumentChunks, TreeSummary};
pub use segmentation::{segment, AssetEntry, Section, Segmentation, TextEntry, TitleEntry};
pub use splitter::RecursiveCharacterSplitter;
pub use tables::{describe_table, load_table, Table};
