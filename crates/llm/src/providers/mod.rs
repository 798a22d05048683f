//! Completion provider implementations.

pub mod gemini;
pub mod ollama;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedClient;
