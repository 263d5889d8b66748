//! Request schema for `/extract` and `/visualize`.

use lexgate_domain::FewShotExample;
use serde::Deserialize;
use thiserror::Error;

/// Input text: one document or an ordered list of documents
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextOrDocuments {
    /// A single document
    Single(String),
    /// Several documents, answered in the same order
    Many(Vec<String>),
}

/// Body of an extraction request
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRequest {
    /// Text to extract from
    pub text_or_documents: TextOrDocuments,

    /// What to extract, in plain language
    pub prompt_description: String,

    /// Few-shot examples
    #[serde(default)]
    pub examples: Vec<FewShotExample>,

    /// Extraction passes per document
    #[serde(default)]
    pub extraction_passes: Option<u32>,

    /// Concurrent model calls per document
    #[serde(default)]
    pub max_workers: Option<u32>,

    /// Chunk size in characters
    #[serde(default)]
    pub max_char_buffer: Option<u32>,

    /// Model override
    #[serde(default)]
    pub model_id: Option<String>,

    /// Inline provider credential
    #[serde(default)]
    pub api_key: Option<String>,

    /// Keep internal fields in the response; `null` leaves it to the engine
    #[serde(default = "default_debug")]
    pub debug: Option<bool>,
}

fn default_debug() -> Option<bool> {
    Some(true)
}

/// Request rejected before any extraction work
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `text_or_documents` was an empty list
    #[error("text_or_documents must contain at least one document")]
    NoDocuments,

    /// No few-shot examples were supplied
    #[error("examples must contain at least one example")]
    NoExamples,
}

impl ExtractionRequest {
    /// Check constraints the JSON schema cannot express
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.text_or_documents {
            TextOrDocuments::Many(docs) if docs.is_empty() => Err(ValidationError::NoDocuments),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ExtractionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_minimal_request_defaults() {
        let req = parse(json!({
            "text_or_documents": "Alice met Bob.",
            "prompt_description": "Extract people."
        }));
        assert_eq!(
            req.text_or_documents,
            TextOrDocuments::Single("Alice met Bob.".to_string())
        );
        assert!(req.examples.is_empty());
        assert!(req.extraction_passes.is_none());
        assert!(req.model_id.is_none());
        assert_eq!(req.debug, Some(true));
    }

    #[test]
    fn test_list_and_explicit_values() {
        let req = parse(json!({
            "text_or_documents": ["a", "b"],
            "prompt_description": "p",
            "extraction_passes": 0,
            "debug": null
        }));
        assert_eq!(
            req.text_or_documents,
            TextOrDocuments::Many(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(req.extraction_passes, Some(0));
        assert_eq!(req.debug, None);
    }

    #[test]
    fn test_wrong_types_rejected() {
        let result: Result<ExtractionRequest, _> = serde_json::from_value(json!({
            "text_or_documents": 42,
            "prompt_description": "p"
        }));
        assert!(result.is_err());

        let result: Result<ExtractionRequest, _> = serde_json::from_value(json!({
            "text_or_documents": "x",
            "prompt_description": "p",
            "max_workers": -1
        }));
        assert!(result.is_err());

        let result: Result<ExtractionRequest, _> =
            serde_json::from_value(json!({"text_or_documents": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_document_list() {
        let mut req = parse(json!({
            "text_or_documents": [],
            "prompt_description": "p"
        }));
        assert_eq!(req.validate(), Err(ValidationError::NoDocuments));

        req.text_or_documents = TextOrDocuments::Many(vec!["x".to_string()]);
        assert_eq!(req.validate(), Ok(()));

        req.text_or_documents = TextOrDocuments::Single(String::new());
        assert_eq!(req.validate(), Ok(()));
    }
}
