//! Error types for protoqa.
//!
//! A single error enum covers configuration, I/O, LLM, prompt, segmentation,
//! dataset and metric failures.

use thiserror::Error;

/// Unified error type for protoqa.
///
/// Library functions return `Result<T, AppError>` and never panic on bad input.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM and embedding provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Document segmentation errors
    #[error("Segmentation error: {0}")]
    Segment(String),

    /// QA dataset generation and record errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Metric computation errors
    #[error("Metric error: {0}")]
    Metric(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Serialization(format!("CSV: {}", err))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_display_prefix() {
        let err = AppError::Metric("no verdicts".to_string());
        assert_eq!(err.to_string(), "Metric error: no verdicts");
    }
}
