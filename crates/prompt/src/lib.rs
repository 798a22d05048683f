//! Prompt system for protoqa.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in catalog compiled into the binary
//! - Workspace overrides under `.protoqa/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_ids, list_prompts, load_prompt, PromptCatalog};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
