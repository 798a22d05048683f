//! Generate command handler.
//!
//! Produces QA pairs for every section chunk of one document, checkpointing
//! the CSV after each chunk.

use super::{llm_client, prompt_catalog};
use clap::Args;
use protoqa_core::{config::AppConfig, AppError, AppResult};
use protoqa_dataset::{prepare_chunks, run_generation, write_records, QaGenerator};
use protoqa_segment::SectionChunk;
use std::path::PathBuf;

/// Generate QA pairs from section chunks
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// `final_chunks.json` written by `chunk`
    pub chunks: PathBuf,

    /// Document title used in prompts and references
    #[arg(short, long)]
    pub title: Option<String>,

    /// QA CSV to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Skip this many eligible chunks
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Process at most this many chunks
    #[arg(long)]
    pub limit: Option<usize>,

    /// Narrow each pair's chunk to the passage it was drawn from
    #[arg(long)]
    pub extract_context: bool,
}

impl GenerateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing generate command");
        tracing::debug!("Generate options: {:?}", self);

        let title = self
            .title
            .clone()
            .or_else(|| config.generation.document_title.clone())
            .ok_or_else(|| {
                AppError::Config(
                    "No document title: pass --title or set generation.documentTitle".to_string(),
                )
            })?;

        let contents = std::fs::read_to_string(&self.chunks)?;
        let chunks: Vec<SectionChunk> = serde_json::from_str(&contents)?;
        let chunks = prepare_chunks(chunks, &config.generation, self.skip, self.limit);

        let generator = QaGenerator::new(
            llm_client(config)?,
            prompt_catalog(config)?,
            &config.model,
            title,
        )
        .with_temperature(config.generation.temperature);

        let mut records =
            run_generation(&generator, &chunks, &config.generation, &self.output).await?;

        if self.extract_context {
            for record in &mut records {
                let context = generator
                    .context_for(&record.question, &record.answer, &record.doc_chunk)
                    .await;
                if context.is_empty() {
                    tracing::warn!(id = record.id, "No context extracted, keeping chunk");
                } else {
                    record.doc_chunk = context;
                }
            }
            write_records(&self.output, &records)?;
        }

        let flagged = records.iter().filter(|r| r.flag_source).count();
        println!(
            "{} pairs from {} chunks ({} flagged) -> {:?}",
            records.len(),
            chunks.len(),
            flagged,
            self.output
        );
        Ok(())
    }
}
