//! Question-answer generation from section chunks.

use crate::records::{format_pages, write_records, QaRecord};
use once_cell::sync::Lazy;
use protoqa_core::{AppResult, GenerationConfig};
use protoqa_llm::{LlmClient, LlmRequest};
use protoqa_prompt::PromptCatalog;
use protoqa_segment::{apply_replacements, SectionChunk};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:\d+[.)]|-)[ \t]*)?\*{0,2}Question\b").expect("valid regex")
});
static ANSWER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\*{0,2}Answer\b").expect("valid regex"));
static QUESTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:\d+[.)]|-)\s*)?\*{0,2}Question\s*\d*\s*[:.]?\s*\*{0,2}")
        .expect("valid regex")
});
static ANSWER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\*{0,2}Answer\s*\*{0,2}\s*:?\s*\*{0,2}").expect("valid regex"));
static CONTEXT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*{0,2}Context\*{0,2}\s*:\s*\*{0,2}").expect("valid regex"));

/// Drop chunks without a section, spell out comparison symbols, keep chunks
/// longer than `min_chunk_chars` characters, then apply the `skip`/`limit`
/// window.
pub fn prepare_chunks(
    chunks: Vec<SectionChunk>,
    config: &GenerationConfig,
    skip: usize,
    limit: Option<usize>,
) -> Vec<SectionChunk> {
    let total = chunks.len();
    let kept: Vec<SectionChunk> = chunks
        .into_iter()
        .filter(|c| c.section_name.is_some())
        .map(|mut c| {
            c.text_chunk = apply_replacements(&c.text_chunk, &config.replacements);
            c
        })
        .filter(|c| c.text_chunk.chars().count() > config.min_chunk_chars)
        .skip(skip)
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    tracing::info!(total, kept = kept.len(), "Prepared chunks for generation");
    kept
}

/// Split a model response into `(question, answer)` pairs.
///
/// A pair starts at a `Question` marker at the start of a line (optionally
/// bolded, numbered or behind a list bullet) and runs to the next one. Blocks without an `Answer`
/// marker are dropped. Labels and asterisks are removed.
pub fn extract_qa(text: &str) -> Vec<(String, String)> {
    let starts: Vec<usize> = QUESTION_MARKER.find_iter(text).map(|m| m.start()).collect();
    let mut pairs = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];

        let Some(answer_at) = ANSWER_MARKER.find(block).map(|m| m.start()) else {
            tracing::debug!("Question without answer skipped: {}", block.trim());
            continue;
        };

        let question = clean(&QUESTION_LABEL.replace(&block[..answer_at], ""));
        let answer = clean(&ANSWER_LABEL.replace(&block[answer_at..], ""));
        if question.is_empty() {
            continue;
        }
        pairs.push((question, answer));
    }

    pairs
}

fn clean(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

/// `For more information, refer to clinical protocol <title>, Section <section>, Pages [p1, p2]`
pub fn reference_for(title: &str, section: &str, pages: &[u32]) -> String {
    format!(
        "For more information, refer to clinical protocol {}, Section {}, Pages {}",
        title,
        section,
        format_pages(pages)
    )
}

/// True when the lower-cased question mentions any keyword.
pub fn flag_source(question: &str, keywords: &[String]) -> bool {
    let lowered = question.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
}

/// Drives the model for question generation and context extraction.
pub struct QaGenerator {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptCatalog>,
    model: String,
    temperature: f32,
    title: String,
}

impl QaGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptCatalog>,
        model: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompts,
            model: model.into(),
            temperature: 0.0,
            title: title.into(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    async fn ask(&self, prompt: String) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_temperature(self.temperature);
        let response = self.client.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Model response for one chunk; empty when the call fails.
    pub async fn generate(&self, chunk: &SectionChunk) -> String {
        let section = chunk.section_name.as_deref().unwrap_or_default();
        let prompt = match self.prompts.render(
            "qa.generate",
            &[
                ("section_name", section),
                ("source", chunk.text_chunk.as_str()),
                ("title", self.title.as_str()),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Error building QA prompt: {}", e);
                return String::new();
            }
        };

        match self.ask(prompt).await {
            Ok(text) => {
                if text.is_empty() {
                    tracing::warn!("Empty QA response for section '{}'", section.trim());
                }
                text
            }
            Err(e) => {
                tracing::error!("Error generating QA for section '{}': {}", section.trim(), e);
                String::new()
            }
        }
    }

    /// The part of `source` a pair was inferred from, without its `Context:`
    /// label. Empty when the call fails.
    pub async fn context_for(&self, question: &str, answer: &str, source: &str) -> String {
        let prompt = match self.prompts.render(
            "qa.context",
            &[("source", source), ("question", question), ("answer", answer)],
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Error building context prompt: {}", e);
                return String::new();
            }
        };

        match self.ask(prompt).await {
            Ok(text) => CONTEXT_LABEL.replace(&text, "").trim().to_string(),
            Err(e) => {
                tracing::error!("Error generating context: {}", e);
                String::new()
            }
        }
    }
}

/// Generate pairs for every chunk, rewriting the checkpoint CSV after each
/// chunk so an interrupted run keeps what it produced.
pub async fn run_generation(
    generator: &QaGenerator,
    chunks: &[SectionChunk],
    config: &GenerationConfig,
    checkpoint: &Path,
) -> AppResult<Vec<QaRecord>> {
    let mut records: Vec<QaRecord> = Vec::new();
    let delay = Duration::from_secs(config.request_delay_secs);

    for (index, chunk) in chunks.iter().enumerate() {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let section = chunk.section_name.as_deref().unwrap_or_default().trim().to_string();
        let response = generator.generate(chunk).await;
        let pairs = extract_qa(&response);
        tracing::info!(
            chunk = index + 1,
            of = chunks.len(),
            pairs = pairs.len(),
            "Generated QA for section '{}'",
            section
        );

        let reference = reference_for(generator.title(), &section, &chunk.pages);
        for (question, answer) in pairs {
            records.push(QaRecord {
                id: records.len() + 1,
                flag_source: flag_source(&question, &config.flag_keywords),
                question,
                answer,
                full_text: response.clone(),
                reference: reference.clone(),
                section: section.clone(),
                pages: chunk.pages.clone(),
                doc_chunk: chunk.text_chunk.clone(),
                title: generator.title().to_string(),
                ground_truth: None,
            });
        }

        write_records(checkpoint, &records)?;
    }

    Ok(records)
}
