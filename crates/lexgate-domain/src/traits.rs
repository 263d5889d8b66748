//! Trait definitions for external interactions
//!
//! The HTTP layer depends on these traits only. Engine implementations live in
//! other crates.

use crate::document::AnnotatedDocument;
use crate::params::ExtractParams;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors reported by an extraction backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// The extraction itself failed (model, credential, parsing, ...)
    #[error("{0}")]
    Extraction(String),

    /// The backend does not offer this capability
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// Rendering the HTML report failed
    #[error("Render error: {0}")]
    Render(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for the engine that turns text into annotated documents
///
/// Implemented by the extraction layer (lexgate-extractor)
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Extract one document
    async fn extract(
        &self,
        text: &str,
        params: &ExtractParams,
    ) -> Result<AnnotatedDocument, BackendError>;

    /// Write documents as JSON lines, one per document, in order
    ///
    /// Lines must match [`crate::encode_jsonl`] for the same `debug`. Backends
    /// without a native writer keep the default, and callers fall back to
    /// writing the serialized documents themselves.
    async fn save_documents(
        &self,
        _documents: &[AnnotatedDocument],
        _path: &Path,
        _debug: bool,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("save_documents"))
    }

    /// Render documents into a single self-contained HTML report
    ///
    /// Internal `_` fields are shown only when `debug` is set.
    fn render_html(
        &self,
        documents: &[AnnotatedDocument],
        debug: bool,
    ) -> Result<String, BackendError>;
}
