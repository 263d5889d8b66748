//! Configuration for the Extractor

use crate::error::ExtractorError;
use lexgate_domain::ExtractParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Defaults applied when a request leaves a tuning knob unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Independent extraction passes per document
    #[serde(default = "default_extraction_passes")]
    pub extraction_passes: u32,

    /// Maximum concurrent model calls per document
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// Maximum characters per chunk
    #[serde(default = "default_max_char_buffer")]
    pub max_char_buffer: u32,

    /// Maximum time for a single model call (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attach diagnostics when the request does not say
    #[serde(default)]
    pub debug: bool,
}

fn default_extraction_passes() -> u32 {
    1
}

fn default_max_workers() -> u32 {
    10
}

fn default_max_char_buffer() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Settings for one extraction call after request values and defaults merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOptions {
    /// Passes to run
    pub passes: u32,
    /// Concurrent chunk calls
    pub workers: usize,
    /// Chunk size in characters
    pub max_char_buffer: usize,
    /// Whether to attach a trace
    pub debug: bool,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_passes == 0 {
            return Err("extraction_passes must be greater than 0".to_string());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".to_string());
        }
        if self.max_char_buffer == 0 {
            return Err("max_char_buffer must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Merge request parameters over these defaults
    ///
    /// A value supplied in the request always wins, and an explicit zero is
    /// rejected rather than silently replaced.
    pub fn resolve(&self, params: &ExtractParams) -> Result<EffectiveOptions, ExtractorError> {
        let passes = positive("extraction_passes", params.extraction_passes)?
            .unwrap_or(self.extraction_passes);
        let workers = positive("max_workers", params.max_workers)?.unwrap_or(self.max_workers);
        let max_char_buffer =
            positive("max_char_buffer", params.max_char_buffer)?.unwrap_or(self.max_char_buffer);

        Ok(EffectiveOptions {
            passes,
            workers: workers as usize,
            max_char_buffer: max_char_buffer as usize,
            debug: params.debug.unwrap_or(self.debug),
        })
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

fn positive(name: &str, value: Option<u32>) -> Result<Option<u32>, ExtractorError> {
    match value {
        Some(0) => Err(ExtractorError::Config(format!(
            "{} must be at least 1",
            name
        ))),
        other => Ok(other),
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            extraction_passes: default_extraction_passes(),
            max_workers: default_max_workers(),
            max_char_buffer: default_max_char_buffer(),
            request_timeout_secs: default_request_timeout_secs(),
            debug: false,
        }
    }
}
