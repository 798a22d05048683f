//! Question-answer dataset generation and evaluation for protoqa.
//!
//! Section chunks produced by `protoqa-segment` are turned into QA pairs by a
//! generator model, written as CSV records, and later scored by a judge model
//! with retrieval-augmented-generation quality metrics.
//!
//! # Modules
//! - [`generation`]: prompt per chunk, QA extraction, references, source flags
//! - [`records`]: the QA record and its CSV form
//! - [`json_repair`]: lenient parsing of model JSON
//! - [`metrics`]: faithfulness, relevancy, precision, recall, correctness, similarity
//! - [`evaluation`]: per-record metric runs with checkpointing
//! - [`summaries`]: figure and table summaries for the inventory

pub mod evaluation;
pub mod generation;
pub mod json_repair;
pub mod metrics;
pub mod records;
pub mod summaries;

pub use evaluation::{write_rows, EvalRow, Evaluator};
pub use generation::{
    extract_qa, flag_source, prepare_chunks, reference_for, run_generation, QaGenerator,
};
pub use json_repair::{as_list, parse_llm_json};
pub use metrics::{EvalSample, Metric, MetricJudge, MetricOutcome};
pub use records::{format_pages, parse_pages, read_records, write_records, QaRecord};
pub use summaries::{summarize_inventory, table_summaries, FigureSummarizer};
