//! LLM provider factory.
//!
//! Builds completion clients and embedding providers from a provider name
//! plus the endpoint, key and model resolved from configuration.

use crate::client::{LlmClient, ProviderType};
use crate::embeddings::{
    trigram, EmbeddingProvider, GeminiEmbeddingProvider, OllamaEmbeddingProvider, TrigramProvider,
};
use crate::providers::{GeminiClient, OllamaClient};
use protoqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Default embedding model and size for Ollama.
const OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
const OLLAMA_EMBEDDING_DIMENSIONS: usize = 768;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required for gemini)
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Gemini) => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(ProviderType::Gemini.default_endpoint());
            Ok(Arc::new(GeminiClient::with_base_url(base_url, key)))
        }
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or(ProviderType::Ollama.default_endpoint());
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Create an embedding provider.
///
/// `trigram` needs nothing; `ollama` and `gemini` use the given endpoint and
/// model, falling back to their defaults.
pub fn create_embedding_provider(
    provider: &str,
    endpoint: Option<&str>,
    model: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider.to_lowercase().as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(trigram::DEFAULT_DIMENSIONS))),
        "ollama" => Ok(Arc::new(OllamaEmbeddingProvider::new(
            endpoint,
            model.unwrap_or(OLLAMA_EMBEDDING_MODEL),
            OLLAMA_EMBEDDING_DIMENSIONS,
        )?)),
        "gemini" | "google" => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(GeminiEmbeddingProvider::new(endpoint, key, model)))
        }
        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, gemini",
            other
        ))),
    }
}
