//! protoqa core library
//!
//! This crate provides the foundational utilities shared by every protoqa crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, EvaluationConfig, GenerationConfig, ProviderConfig, Replacement, SegmentationConfig,
};
pub use error::{AppError, AppResult};
