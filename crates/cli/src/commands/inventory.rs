//! Inventory command handler.

use clap::Args;
use protoqa_core::{config::AppConfig, AppResult};
use protoqa_segment::{build_inventory, write_inventory, StructuredDocument};
use std::path::PathBuf;

/// List figures and tables with the text nested under them
#[derive(Args, Debug)]
pub struct InventoryCommand {
    /// Structured document (PDF extract JSON)
    pub document: PathBuf,

    /// Inventory CSV to write
    #[arg(short, long)]
    pub output: PathBuf,
}

impl InventoryCommand {
    pub fn execute(&self, _config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing inventory command");

        let document = StructuredDocument::load(&self.document)?;
        let records = build_inventory(&document);
        write_inventory(&self.output, &records)?;

        println!("{} figures and tables -> {:?}", records.len(), self.output);
        Ok(())
    }
}
