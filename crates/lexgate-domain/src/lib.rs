//! lexgate Domain Layer
//!
//! Shared vocabulary for the extraction gateway: the few-shot examples a caller
//! sends, the annotated documents an extraction backend returns, and the trait
//! boundary between the HTTP façade and whatever engine performs the extraction.
//!
//! ## Key Concepts
//!
//! - **Extraction record**: a labeled span with a class and free-form attributes
//! - **Few-shot example**: a text plus the records the model should find in it
//! - **Annotated document**: one document's extraction result with alignment data
//! - **Alignment status**: how precisely a span was located in the source text
//!
//! ## Architecture
//!
//! The server crate only ever talks to [`ExtractionBackend`]. Engines live in
//! other crates and convert their internal results into [`AnnotatedDocument`]
//! at that single boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod json;
pub mod mock;
pub mod params;
pub mod traits;

// Re-exports for convenience
pub use document::{
    AlignmentStatus, AnnotatedDocument, CharInterval, Extraction, ExtractionRecord,
    ExtractionTrace, FewShotExample,
};
pub use json::{document_to_value, encode_jsonl, strip_internal};
pub use mock::MockBackend;
pub use params::ExtractParams;
pub use traits::{BackendError, ExtractionBackend};
