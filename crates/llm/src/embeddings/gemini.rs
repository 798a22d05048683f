//! Gemini embedding provider (`models/{model}:embedContent`).

use super::EmbeddingProvider;
use crate::client::ProviderType;
use crate::providers::gemini::{Content, API_KEY_HEADER};
use protoqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "text-embedding-004";
pub const DEFAULT_DIMENSIONS: usize = 768;

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    pub fn new(base_url: Option<&str>, api_key: impl Into<String>, model: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(ProviderType::Gemini.default_endpoint())
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&EmbedContentRequest {
                content: Content::text(text),
            })
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to send embedding request to Gemini: {}",
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Gemini embedding error ({}): {}",
                status, body
            )));
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Llm(format!("Failed to parse Gemini embedding: {}", e.without_url()))
            })?;
        Ok(parsed.embedding.values)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}
