//! Command handlers for the protoqa CLI.
//!
//! One submodule per pipeline stage, plus the client and prompt wiring the
//! model-backed stages share.

pub mod apply_summaries;
pub mod chunk;
pub mod evaluate;
pub mod generate;
pub mod inventory;
pub mod summarize;

pub use apply_summaries::ApplySummariesCommand;
pub use chunk::ChunkCommand;
pub use evaluate::EvaluateCommand;
pub use generate::GenerateCommand;
pub use inventory::InventoryCommand;
pub use summarize::SummarizeCommand;

use protoqa_core::{config::AppConfig, AppResult};
use protoqa_llm::{
    create_client, create_embedding_provider, EmbeddingProvider, LlmClient, OllamaClient,
};
use protoqa_prompt::PromptCatalog;
use std::sync::Arc;

/// Completion client for the active provider.
fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    config.validate()?;
    let endpoint = config.provider_endpoint(&config.provider);
    let api_key = config.resolve_api_key(&config.provider);
    tracing::debug!(provider = %config.provider, endpoint = ?endpoint, "Creating LLM client");

    let timeout = config
        .get_provider_config(&config.provider)
        .and_then(|p| p.timeout_secs());
    if let (Some(secs), Some(url)) = (timeout, endpoint.as_deref()) {
        return Ok(Arc::new(OllamaClient::with_timeout(url, secs)?));
    }
    create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())
}

/// Embedding provider for the similarity metrics.
fn embedding_provider(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let provider = config.embedding_provider();
    let endpoint = config.provider_endpoint(&provider);
    let model = config.embedding_model(&provider);
    let api_key = config.resolve_api_key(&provider);
    tracing::debug!(provider = %provider, model = ?model, "Creating embedding provider");
    create_embedding_provider(&provider, endpoint.as_deref(), model.as_deref(), api_key.as_deref())
}

/// Built-in prompts with `.protoqa/prompts` overrides.
fn prompt_catalog(config: &AppConfig) -> AppResult<Arc<PromptCatalog>> {
    let dir = config.prompts_dir();
    let catalog = if dir.is_dir() {
        PromptCatalog::load(Some(&dir))?
    } else {
        PromptCatalog::builtin()?
    };
    Ok(Arc::new(catalog))
}
