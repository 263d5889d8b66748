//! Deterministic backend for tests
//!
//! Returns one extraction per document (the first word) without touching any
//! model, and records every call so tests can assert on what reached the
//! backend.

use crate::document::{
    AlignmentStatus, AnnotatedDocument, CharInterval, Extraction, ExtractionTrace,
};
use crate::json::encode_jsonl;
use crate::params::ExtractParams;
use crate::traits::{BackendError, ExtractionBackend};
use async_trait::async_trait;
use serde_json::Map;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<(String, ExtractParams)>,
    saves: usize,
}

/// Mock extraction backend
///
/// # Examples
///
/// ```
/// use lexgate_domain::{ExtractParams, ExtractionBackend, MockBackend};
///
/// let backend = MockBackend::new();
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let doc = rt
///     .block_on(backend.extract("Alice met Bob", &ExtractParams::default()))
///     .unwrap();
/// assert_eq!(doc.extractions[0].extraction_text, "Alice");
/// assert_eq!(backend.call_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    failure: Option<String>,
    native_save: bool,
    render_failure: bool,
}

impl MockBackend {
    /// Create a backend that succeeds and has no native JSONL writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `extract` call fail with `message`
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Enable or disable the native JSONL writer
    pub fn with_native_save(mut self, enabled: bool) -> Self {
        self.native_save = enabled;
        self
    }

    /// Make `render_html` fail
    pub fn with_render_failure(mut self) -> Self {
        self.render_failure = true;
        self
    }

    /// Number of `extract` calls so far
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Texts and parameters of every `extract` call, in order
    pub fn calls(&self) -> Vec<(String, ExtractParams)> {
        self.lock().calls.clone()
    }

    /// Number of successful native saves
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract(
        &self,
        text: &str,
        params: &ExtractParams,
    ) -> Result<AnnotatedDocument, BackendError> {
        let ordinal = {
            let mut state = self.lock();
            state.calls.push((text.to_string(), params.clone()));
            state.calls.len()
        };

        if let Some(message) = &self.failure {
            return Err(BackendError::Extraction(message.clone()));
        }

        let extractions = text
            .split_whitespace()
            .next()
            .map(|word| {
                let start = text.find(word).unwrap_or(0);
                let start_pos = text[..start].chars().count();
                vec![Extraction {
                    extraction_class: "token".to_string(),
                    extraction_text: word.to_string(),
                    char_interval: Some(CharInterval {
                        start_pos,
                        end_pos: start_pos + word.chars().count(),
                    }),
                    alignment_status: Some(AlignmentStatus::MatchExact),
                    extraction_index: 0,
                    group_index: 0,
                    attributes: Map::new(),
                }]
            })
            .unwrap_or_default();

        let trace = (params.debug == Some(true)).then(|| ExtractionTrace {
            model_id: params.model_id.clone(),
            passes: params.extraction_passes.unwrap_or(1),
            chunk_count: 1,
            raw_output_chars: vec![0],
        });

        Ok(AnnotatedDocument {
            document_id: format!("doc_{}", ordinal),
            text: text.to_string(),
            extractions,
            trace,
        })
    }

    async fn save_documents(
        &self,
        documents: &[AnnotatedDocument],
        path: &Path,
        debug: bool,
    ) -> Result<(), BackendError> {
        if !self.native_save {
            return Err(BackendError::Unsupported("save_documents"));
        }
        let out = encode_jsonl(documents, debug)
            .map_err(|e| BackendError::Extraction(e.to_string()))?;
        std::fs::write(path, out)?;
        self.lock().saves += 1;
        Ok(())
    }

    fn render_html(
        &self,
        documents: &[AnnotatedDocument],
        debug: bool,
    ) -> Result<String, BackendError> {
        if self.render_failure {
            return Err(BackendError::Render("mock render failure".to_string()));
        }
        let lines =
            encode_jsonl(documents, debug).map_err(|e| BackendError::Render(e.to_string()))?;
        Ok(format!(
            "<html><body><p>{} document(s)</p><pre>{}</pre></body></html>",
            documents.len(),
            lines.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
        ))
    }
}
