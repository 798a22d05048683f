//! Gemini LLM provider implementation.
//!
//! Talks to the Generative Language REST API:
//! `POST {endpoint}/v1beta/models/{model}:generateContent`, with the API key
//! in the `x-goog-api-key` header so it never appears in request URLs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ProviderType};
use protoqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct Content {
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct Part {
    #[serde(default)]
    pub(crate) text: String,
}

impl Content {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini LLM client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public Gemini endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ProviderType::Gemini.default_endpoint(), api_key)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents: vec![Content::text(request.prompt.clone())],
            system_instruction: request.system.as_ref().map(|s| Content::text(s.clone())),
            generation_config,
        }
    }

    fn convert_response(&self, model: &str, response: GenerateContentResponse) -> LlmResponse {
        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        LlmResponse {
            content,
            model: model.to_string(),
            usage,
            done: true,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Gemini");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.to_gemini_request(request))
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!("Failed to send request to Gemini: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Llm(format!("Failed to parse Gemini response: {}", e.without_url()))
            })?;

        if gemini_response.candidates.is_empty() {
            tracing::warn!(model = %request.model, "Gemini returned no candidates");
        }

        Ok(self.convert_response(&request.model, gemini_response))
    }
}
