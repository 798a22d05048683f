//! Chunk command handler.
//!
//! Segments every document folder under an input root into section chunks.

use clap::Args;
use protoqa_core::{config::AppConfig, AppResult};
use protoqa_segment::process_tree;
use std::path::PathBuf;

/// Segment every document folder into section chunks
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// Root folder with one subfolder per document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Root folder for the outputs (one subfolder per document)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Only process this document folder
    #[arg(short, long)]
    pub document: Option<String>,
}

impl ChunkCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunk command");
        tracing::debug!("Chunk options: {:?}", self);

        config.segmentation.validate()?;
        let summary = process_tree(
            &self.input,
            &self.output,
            &config.segmentation,
            self.document.as_deref(),
        )?;

        for name in &summary.processed {
            println!("chunked  {}", name);
        }
        for name in &summary.skipped {
            println!("skipped  {} (no {})", name, config.segmentation.target_file);
        }
        println!(
            "{} processed, {} skipped",
            summary.processed.len(),
            summary.skipped.len()
        );

        Ok(())
    }
}
