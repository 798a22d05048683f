//! Apply-summaries command handler.
//!
//! The edit step: figure elements take their summary as text and the text
//! nested under them is blanked, so chunking sees one prose block per figure.

use clap::Args;
use protoqa_core::{config::AppConfig, AppResult};
use protoqa_segment::{apply_summaries, read_inventory, StructuredDocument};
use std::path::PathBuf;

/// Write inventory summaries back into a structured document
#[derive(Args, Debug)]
pub struct ApplySummariesCommand {
    /// Structured document (PDF extract JSON)
    pub document: PathBuf,

    /// Inventory CSV with summaries
    pub inventory: PathBuf,

    /// Edited document to write
    #[arg(short, long)]
    pub output: PathBuf,
}

impl ApplySummariesCommand {
    pub fn execute(&self, _config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing apply-summaries command");

        let mut document = StructuredDocument::load(&self.document)?;
        let records = read_inventory(&self.inventory)?;
        let changed = apply_summaries(&mut document, &records);
        document.save(&self.output)?;

        println!("{} elements edited -> {:?}", changed, self.output);
        Ok(())
    }
}
