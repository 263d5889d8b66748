//! lexgate LLM Provider Layer
//!
//! Pluggable model providers used by the extraction engine.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Google Gemini `generateContent` API
//! - `OllamaProvider`: Local Ollama API
//!
//! Providers are created per request by a [`ProviderFactory`], because the
//! model id and credential both arrive with the request.
//!
//! # Examples
//!
//! ```
//! use lexgate_llm::{LlmProvider, MockProvider};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockProvider::new(r#"{"extractions": []}"#);
//! let output = provider.generate("Extract people from: Alice met Bob.").await.unwrap();
//! assert_eq!(output, r#"{"extractions": []}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod factory;
pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use factory::{DefaultProviderFactory, MockFactory, ProviderFactory, ProviderSettings};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider rejected the credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider needs a credential and none was supplied
    #[error("Model '{0}' requires an API key")]
    MissingCredential(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Trait for text-generation backends
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Identifier of the model this provider talks to
    fn model_id(&self) -> &str;
}

#[derive(Debug, Default)]
struct MockState {
    responses: Vec<(String, String)>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// specific response is chosen when the prompt contains its registered
/// needle; otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use lexgate_llm::{LlmProvider, MockProvider};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("aspirin", r#"{"extractions": []}"#);
/// assert_eq!(provider.generate("...aspirin...").await.unwrap(), r#"{"extractions": []}"#);
/// assert_eq!(provider.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    model_id: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model_id: "mock-model".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Return `response` for any prompt containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.lock().responses.push((needle.into(), response.into()));
    }

    /// Fail any prompt containing `needle`
    pub fn add_error(&mut self, needle: impl Into<String>) {
        self.add_response(needle, "ERROR");
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.lock().prompts.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"extractions": []}"#)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut state = self.lock();
        state.prompts.push(prompt.to_string());

        let matched = state
            .responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        match matched {
            Some(response) if response == "ERROR" => Err(LlmError::Other("Mock error".to_string())),
            Some(response) => Ok(response),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
