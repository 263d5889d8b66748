//! Core Extractor implementation

use crate::alignment::{align, char_position};
use crate::chunking::{chunk_text, TextChunk};
use crate::config::{EffectiveOptions, ExtractorConfig};
use crate::error::ExtractorError;
use crate::parser::{parse_model_output, Candidate};
use crate::prompt::PromptBuilder;
use crate::{jsonl, visualize};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use lexgate_domain::{
    AnnotatedDocument, BackendError, CharInterval, ExtractParams, Extraction,
    ExtractionBackend, ExtractionTrace,
};
use lexgate_llm::{LlmProvider, ProviderFactory};
use std::path::Path;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns documents into annotated documents using an LLM
///
/// Each document is chunked, every chunk is sent to the model with the
/// few-shot prompt, and the returned spans are aligned back to character
/// positions in the document.
pub struct Extractor<F>
where
    F: ProviderFactory,
{
    factory: F,
    config: ExtractorConfig,
}

impl<F> Extractor<F>
where
    F: ProviderFactory,
{
    /// Create a new Extractor
    pub fn new(factory: F, config: ExtractorConfig) -> Self {
        Self { factory, config }
    }

    /// Defaults applied to requests
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract one document
    pub async fn extract_document(
        &self,
        text: &str,
        params: &ExtractParams,
    ) -> Result<AnnotatedDocument, ExtractorError> {
        let options = self.config.resolve(params)?;

        if params.examples.is_empty() {
            warn!("Extracting without few-shot examples");
        }

        let provider = self
            .factory
            .create(&params.model_id, params.api_key.as_deref())?;
        let prompt = PromptBuilder::new(&params.prompt_description, &params.examples);
        let chunks = chunk_text(text, options.max_char_buffer);

        info!(
            model = %params.model_id,
            chars = text.chars().count(),
            chunks = chunks.len(),
            passes = options.passes,
            "Starting extraction"
        );

        let mut accepted: Vec<Extraction> = Vec::new();
        let mut raw_output_chars = Vec::new();

        for pass in 0..options.passes {
            let outputs = self
                .run_pass(provider.as_ref(), &prompt, &chunks, &options)
                .await?;

            let mut added = 0;
            for (chunk, raw) in chunks.iter().zip(outputs) {
                raw_output_chars.push(raw.chars().count());
                for extraction in self.align_chunk(text, chunk, parse_model_output(&raw)?) {
                    if pass > 0 && conflicts(&accepted, &extraction) {
                        continue;
                    }
                    accepted.push(extraction);
                    added += 1;
                }
            }
            debug!("Pass {} added {} extractions", pass + 1, added);
        }

        // Aligned spans in document order, unaligned ones after them
        accepted.sort_by_key(|e| e.char_interval.map_or(usize::MAX, |iv| iv.start_pos));
        for (index, extraction) in accepted.iter_mut().enumerate() {
            extraction.extraction_index = index;
        }

        let trace = options.debug.then(|| ExtractionTrace {
            model_id: provider.model_id().to_string(),
            passes: options.passes,
            chunk_count: chunks.len(),
            raw_output_chars,
        });

        info!("Extraction complete: {} extractions", accepted.len());

        Ok(AnnotatedDocument {
            document_id: new_document_id(),
            text: text.to_string(),
            extractions: accepted,
            trace,
        })
    }

    /// Send every chunk to the model, at most `workers` at a time
    ///
    /// Outputs come back in chunk order.
    async fn run_pass(
        &self,
        provider: &dyn LlmProvider,
        prompt: &PromptBuilder,
        chunks: &[TextChunk],
        options: &EffectiveOptions,
    ) -> Result<Vec<String>, ExtractorError> {
        let limit = self.config.request_timeout();
        let limit_secs = self.config.request_timeout_secs;

        // Collect before streaming: a lazily mapped iterator is not Send
        // under async_trait
        let calls: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let rendered = prompt.render(&chunk.text);
                async move {
                    debug!(
                        chunk = chunk.ordinal,
                        prompt_chars = rendered.len(),
                        "Calling model"
                    );
                    let output = timeout(limit, provider.generate(&rendered))
                        .await
                        .map_err(|_| ExtractorError::Timeout(limit_secs))??;
                    debug!(chunk = chunk.ordinal, output_chars = output.len(), "Model returned");
                    Ok::<_, ExtractorError>(output)
                }
            })
            .collect();

        stream::iter(calls)
            .buffered(options.workers.max(1))
            .try_collect()
            .await
    }

    /// Align one chunk's candidates to document character positions
    fn align_chunk(
        &self,
        document: &str,
        chunk: &TextChunk,
        candidates: Vec<Candidate>,
    ) -> Vec<Extraction> {
        let mut cursor = 0;
        candidates
            .into_iter()
            .map(|candidate| {
                let located = align(&chunk.text, &candidate.extraction_text, cursor);
                let (char_interval, alignment_status) = match located {
                    Some(alignment) => {
                        cursor = alignment.range.end;
                        let start = chunk.byte_offset + alignment.range.start;
                        let end = chunk.byte_offset + alignment.range.end;
                        (
                            Some(CharInterval {
                                start_pos: char_position(document, start),
                                end_pos: char_position(document, end),
                            }),
                            Some(alignment.status),
                        )
                    }
                    None => {
                        debug!(
                            "Could not align '{}' in chunk {}",
                            candidate.extraction_text, chunk.ordinal
                        );
                        (None, None)
                    }
                };

                Extraction {
                    extraction_class: candidate.extraction_class,
                    extraction_text: candidate.extraction_text,
                    char_interval,
                    alignment_status,
                    extraction_index: 0,
                    group_index: chunk.ordinal,
                    attributes: candidate.attributes,
                }
            })
            .collect()
    }
}

/// Whether a later-pass extraction duplicates one already accepted
fn conflicts(accepted: &[Extraction], candidate: &Extraction) -> bool {
    match candidate.char_interval {
        Some(interval) => accepted
            .iter()
            .filter_map(|e| e.char_interval)
            .any(|existing| existing.overlaps(&interval)),
        None => accepted.iter().any(|e| {
            e.extraction_class == candidate.extraction_class
                && e.extraction_text == candidate.extraction_text
        }),
    }
}

fn new_document_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("doc_{}", &id[..8])
}

#[async_trait]
impl<F> ExtractionBackend for Extractor<F>
where
    F: ProviderFactory,
{
    async fn extract(
        &self,
        text: &str,
        params: &ExtractParams,
    ) -> Result<AnnotatedDocument, BackendError> {
        Ok(self.extract_document(text, params).await?)
    }

    async fn save_documents(
        &self,
        documents: &[AnnotatedDocument],
        path: &Path,
        debug: bool,
    ) -> Result<(), BackendError> {
        Ok(jsonl::save_documents(documents, path, debug).await?)
    }

    fn render_html(
        &self,
        documents: &[AnnotatedDocument],
        debug: bool,
    ) -> Result<String, BackendError> {
        Ok(visualize::render_html(documents, debug))
    }
}
