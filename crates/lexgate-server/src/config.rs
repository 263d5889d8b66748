//! Configuration for the lexgate server.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and environment variables. The result is immutable
//! for the life of the process.

use lexgate_extractor::ExtractorConfig;
use lexgate_llm::ProviderSettings;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A setting has an unusable value
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Server configuration
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Model used when a request does not name one
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Root directory for visualize artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Server-held provider credential
    #[serde(default)]
    pub client_api_key: Option<String>,

    /// Accept requests without any credential or examples (smoke tests only)
    #[serde(default)]
    pub allow_missing_credentials: bool,

    /// Model provider endpoints
    #[serde(default)]
    pub providers: ProviderSettings,

    /// Extraction defaults
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_model_id() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            model_id: default_model_id(),
            artifacts_dir: default_artifacts_dir(),
            client_api_key: None,
            allow_missing_credentials: false,
            providers: ProviderSettings::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("bind_port", &self.bind_port)
            .field("model_id", &self.model_id)
            .field("artifacts_dir", &self.artifacts_dir)
            .field(
                "client_api_key",
                &self.client_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("allow_missing_credentials", &self.allow_missing_credentials)
            .field("providers", &self.providers)
            .field("extractor", &self.extractor)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model_id) = non_empty(lookup("MODEL_ID")) {
            self.model_id = model_id;
        }

        if let Some(dir) = non_empty(lookup("ARTIFACTS_DIR")) {
            self.artifacts_dir = PathBuf::from(dir);
        }

        if let Some(key) = non_empty(lookup("CLIENT_API_KEY")) {
            self.client_api_key = Some(key);
        }

        if let Some(flag) = lookup("ALLOW_MISSING_CREDENTIALS") {
            self.allow_missing_credentials = is_truthy(&flag);
        }

        if let Some(address) = non_empty(lookup("LEXGATE_BIND_ADDRESS")) {
            self.bind_address = address;
        }

        if let Some(port) = non_empty(lookup("LEXGATE_BIND_PORT")) {
            self.bind_port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "LEXGATE_BIND_PORT".to_string(),
                reason: format!("'{}' is not a port number", port),
            })?;
        }

        if let Some(endpoint) = non_empty(lookup("OLLAMA_ENDPOINT")) {
            self.providers.ollama_endpoint = endpoint;
        }

        if let Some(endpoint) = non_empty(lookup("GEMINI_ENDPOINT")) {
            self.providers.gemini_endpoint = endpoint;
        }

        Ok(self)
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "model_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        self.extractor
            .validate()
            .map_err(|reason| ConfigError::InvalidValue {
                name: "extractor".to_string(),
                reason,
            })
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
