//! Summarize command handler.

use super::{llm_client, prompt_catalog};
use clap::Args;
use protoqa_core::{config::AppConfig, AppResult};
use protoqa_dataset::{summarize_inventory, FigureSummarizer};
use protoqa_segment::{read_inventory, write_inventory, SUMMARY_FAILED};
use std::path::PathBuf;

/// Summarize inventory figures and tables
#[derive(Args, Debug)]
pub struct SummarizeCommand {
    /// Inventory CSV written by `inventory`
    pub inventory: PathBuf,

    /// Folder with exported table files (`file*.csv`, `file*.xlsx`)
    #[arg(short, long)]
    pub tables: Option<PathBuf>,

    /// Inventory CSV to write
    #[arg(short, long)]
    pub output: PathBuf,
}

impl SummarizeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing summarize command");
        tracing::debug!("Summarize options: {:?}", self);

        let mut records = read_inventory(&self.inventory)?;
        let summarizer =
            FigureSummarizer::new(llm_client(config)?, prompt_catalog(config)?, &config.model)
                .with_temperature(config.generation.temperature);

        let summarized =
            summarize_inventory(&mut records, self.tables.as_deref(), &summarizer).await?;
        write_inventory(&self.output, &records)?;

        let failed = records.iter().filter(|r| r.summary == SUMMARY_FAILED).count();
        println!(
            "{} records, {} summarized by model, {} failed -> {:?}",
            records.len(),
            summarized,
            failed,
            self.output
        );
        Ok(())
    }
}
