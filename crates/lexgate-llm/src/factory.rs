//! Provider selection by model id
//!
//! `gemini*` ids go to Gemini and need a credential. `ollama/<model>` and the
//! common open-weight families go to a local Ollama server. Anything else is
//! reported as an unavailable model.

use crate::{GeminiProvider, LlmError, LlmProvider, MockProvider, OllamaProvider};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model families served through Ollama without an explicit prefix
const OLLAMA_FAMILIES: &[&str] = &["gemma", "llama", "mistral", "qwen", "phi", "deepseek"];

/// Builds a provider for a model id and optional credential
pub trait ProviderFactory: Send + Sync {
    /// Resolve the provider for one request
    fn create(
        &self,
        model_id: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn LlmProvider>, LlmError>;
}

/// Endpoints and timeouts for the built-in providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Gemini API base URL
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,

    /// Ollama API base URL
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,

    /// Per-call HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_endpoint() -> String {
    crate::gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_ollama_endpoint() -> String {
    crate::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    crate::ollama::DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            gemini_endpoint: default_gemini_endpoint(),
            ollama_endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which built-in provider serves a model id
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Gemini(String),
    Ollama(String),
}

fn route(model_id: &str) -> Result<Route, LlmError> {
    if let Some(model) = model_id.strip_prefix("ollama/") {
        return Ok(Route::Ollama(model.to_string()));
    }
    if model_id.starts_with("gemini") {
        return Ok(Route::Gemini(model_id.to_string()));
    }
    if OLLAMA_FAMILIES.iter().any(|family| model_id.starts_with(family)) {
        return Ok(Route::Ollama(model_id.to_string()));
    }
    Err(LlmError::ModelNotAvailable(model_id.to_string()))
}

/// Factory for the Gemini and Ollama providers
///
/// Holds one HTTP client shared by every provider it creates.
pub struct DefaultProviderFactory {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl DefaultProviderFactory {
    /// Create a factory from provider settings
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self { settings, client })
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create(
        &self,
        model_id: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match route(model_id)? {
            Route::Gemini(model) => {
                let key = api_key
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| LlmError::MissingCredential(model.clone()))?;
                Ok(Arc::new(GeminiProvider::with_client(
                    self.client.clone(),
                    &self.settings.gemini_endpoint,
                    model,
                    key,
                )))
            }
            Route::Ollama(model) => Ok(Arc::new(OllamaProvider::with_client(
                self.client.clone(),
                &self.settings.ollama_endpoint,
                model,
            ))),
        }
    }
}

/// Factory that always hands out the same [`MockProvider`]
///
/// Records every `(model_id, api_key)` pair it was asked for.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    provider: MockProvider,
    requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl MockFactory {
    /// Wrap a mock provider
    pub fn new(provider: MockProvider) -> Self {
        Self {
            provider,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The shared provider, for inspecting prompts and call counts
    pub fn provider(&self) -> &MockProvider {
        &self.provider
    }

    /// Every model id and credential requested so far
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProviderFactory for MockFactory {
    fn create(
        &self,
        model_id: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn LlmProvider>, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((model_id.to_string(), api_key.map(str::to_string)));
        Ok(Arc::new(self.provider.clone()))
    }
}
