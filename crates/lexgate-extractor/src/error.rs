//! Error types for the Extractor

use lexgate_domain::BackendError;
use lexgate_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Model call exceeded the configured timeout
    #[error("Extraction timeout after {0}s")]
    Timeout(u64),

    /// Model output could not be interpreted
    #[error("Invalid model output: {0}")]
    InvalidFormat(String),

    /// Invalid tuning parameter or configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractorError> for BackendError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::Io(io) => BackendError::Io(io),
            other => BackendError::Extraction(other.to_string()),
        }
    }
}
