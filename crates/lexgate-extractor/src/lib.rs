//! lexgate Extractor
//!
//! Turns free text into annotated documents with a generative model.
//!
//! # Overview
//!
//! A document is split into chunks, each chunk is sent to the model together
//! with a few-shot prompt, and the spans the model returns are aligned back to
//! character positions in the original text. Several passes may run over the
//! same document to improve recall; later passes only contribute spans that do
//! not overlap earlier ones.
//!
//! # Architecture
//!
//! ```text
//! Text → chunk → prompt → LLM → parse → align → AnnotatedDocument
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use lexgate_domain::ExtractParams;
//! use lexgate_extractor::{Extractor, ExtractorConfig};
//! use lexgate_llm::{MockFactory, MockProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(
//!     r#"{"extractions": [{"extraction_class": "medication", "extraction_text": "aspirin"}]}"#,
//! );
//! let extractor = Extractor::new(MockFactory::new(provider), ExtractorConfig::default());
//!
//! let params = ExtractParams {
//!     prompt_description: "Extract medications.".to_string(),
//!     model_id: "mock-model".to_string(),
//!     ..Default::default()
//! };
//!
//! let doc = extractor.extract_document("Patient takes aspirin.", &params).await?;
//! println!("Found {} extractions", doc.extractions.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod alignment;
mod chunking;
mod config;
mod error;
mod extractor;
mod jsonl;
mod parser;
mod prompt;
mod visualize;


pub use alignment::{align, Alignment};
pub use chunking::{chunk_text, TextChunk};
pub use config::{EffectiveOptions, ExtractorConfig};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use jsonl::save_documents;
pub use parser::{parse_model_output, Candidate};
pub use visualize::{html_escape, render_html};
