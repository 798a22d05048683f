//! Summaries for the figure and table inventory.
//!
//! Tables exported as local files are described directly from their cells.
//! Everything still lacking a summary is summarized by the model from the
//! text nested under the figure; failures leave [`SUMMARY_FAILED`].

use protoqa_core::AppResult;
use protoqa_llm::{LlmClient, LlmRequest};
use protoqa_prompt::PromptCatalog;
use protoqa_segment::{load_table, merge_summaries, FigureRecord, SUMMARY_FAILED};
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// `(file name, prose)` for every `file*.csv` / `file*.xlsx` under `dir`.
/// Unreadable tables are logged and skipped.
pub fn table_summaries(dir: &Path) -> Vec<(String, String)> {
    let mut summaries = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let lower = name.to_lowercase();
        if !lower.starts_with("file") || !(lower.ends_with(".xlsx") || lower.ends_with(".csv")) {
            continue;
        }
        match load_table(entry.path()) {
            Ok(table) => summaries.push((name, table.describe())),
            Err(e) => tracing::warn!("Skipping table {:?}: {}", entry.path(), e),
        }
    }
    summaries
}

/// Model-backed summaries of figure text.
pub struct FigureSummarizer {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptCatalog>,
    model: String,
    temperature: f32,
}

impl FigureSummarizer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptCatalog>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompts,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn request(&self, prompt_id: &str, text: &str) -> AppResult<String> {
        let prompt = self.prompts.render(prompt_id, &[("text", text)])?;
        let request = LlmRequest::new(prompt, &self.model).with_temperature(self.temperature);
        let response = self.client.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Summary of one record's nested text, or [`SUMMARY_FAILED`].
    pub async fn summarize(&self, record: &FigureRecord) -> String {
        let text = record.texts.join("\n");
        if text.trim().is_empty() {
            tracing::warn!(files = %record.files, "No text to summarize");
            return SUMMARY_FAILED.to_string();
        }

        let prompt_id = if record.general_path.contains("/Table") {
            "table.summary"
        } else {
            "figure.summary"
        };
        let result = self.request(prompt_id, &text).await;
        match result {
            Ok(summary) if !summary.is_empty() => summary,
            Ok(_) => {
                tracing::warn!(files = %record.files, "Empty summary");
                SUMMARY_FAILED.to_string()
            }
            Err(e) => {
                tracing::error!(files = %record.files, "Summary failed: {}", e);
                SUMMARY_FAILED.to_string()
            }
        }
    }
}

/// Fill in summaries: local table prose is merged into every matching
/// record, then the model covers records still missing one. Returns the number of records summarized by the model.
pub async fn summarize_inventory(
    records: &mut [FigureRecord],
    tables_dir: Option<&Path>,
    summarizer: &FigureSummarizer,
) -> AppResult<usize> {
    if let Some(dir) = tables_dir {
        let tables = table_summaries(dir);
        let merged = merge_summaries(records, &tables, false);
        tracing::info!(tables = tables.len(), merged, "Merged local table descriptions");
    }

    let mut summarized = 0;
    for record in records.iter_mut().filter(|r| r.needs_summary()) {
        record.summary = summarizer.summarize(record).await;
        summarized += 1;
        tracing::info!(files = %record.files, "Summarized figure");
    }
    Ok(summarized)
}
