//! Request to backend-call translation.

use crate::config::ServerConfig;
use crate::request::{ExtractionRequest, TextOrDocuments, ValidationError};
use lexgate_domain::ExtractParams;

/// Server-side values a request falls back on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDefaults {
    /// Model used when the request names none
    pub model_id: String,
    /// Debug setting when the request sends `debug: null`; the engine reads
    /// the same value
    pub debug: bool,
    /// Smoke-test mode: accept requests without few-shot examples
    pub allow_missing_examples: bool,
}

impl CallDefaults {
    /// Defaults taken from startup configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            model_id: config.model_id.clone(),
            debug: config.extractor.debug,
            allow_missing_examples: config.allow_missing_credentials,
        }
    }
}

/// One request, ready for the backend
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    /// Documents in input order
    pub documents: Vec<String>,
    /// The request sent a bare string rather than a list
    pub single: bool,
    /// Whether internal `_` fields stay in responses and artifacts
    pub debug: bool,
    /// Parameters shared by every document
    pub params: ExtractParams,
}

/// Build the backend call for a validated request
///
/// Optional knobs stay `None` unless the caller sent them; explicit values,
/// zero included, pass through untouched. A request without examples is
/// rejected unless the defaults allow it.
pub fn normalize(
    request: ExtractionRequest,
    defaults: &CallDefaults,
    api_key: Option<String>,
) -> Result<NormalizedCall, ValidationError> {
    if request.examples.is_empty() && !defaults.allow_missing_examples {
        return Err(ValidationError::NoExamples);
    }

    let (documents, single) = match request.text_or_documents {
        TextOrDocuments::Single(text) => (vec![text], true),
        TextOrDocuments::Many(docs) => (docs, false),
    };

    let model_id = request
        .model_id
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| defaults.model_id.clone());

    Ok(NormalizedCall {
        documents,
        single,
        debug: request.debug.unwrap_or(defaults.debug),
        params: ExtractParams {
            prompt_description: request.prompt_description,
            examples: request.examples,
            model_id,
            api_key,
            extraction_passes: request.extraction_passes,
            max_workers: request.max_workers,
            max_char_buffer: request.max_char_buffer,
            debug: request.debug,
        },
    })
}
