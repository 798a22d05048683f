//! LLM integration crate for protoqa.
//!
//! This crate provides a provider-agnostic abstraction for the two kinds of
//! model calls the pipeline makes: text completions (QA generation, context
//! extraction, metric judgements) and text embeddings (answer relevancy and
//! answer similarity).
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use protoqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod embeddings;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ProviderType};
pub use embeddings::{cosine_similarity, EmbeddingProvider};
pub use factory::{create_client, create_embedding_provider};
pub use providers::{GeminiClient, OllamaClient};
#[cfg(any(test, feature = "testing"))]
pub use providers::ScriptedClient;
