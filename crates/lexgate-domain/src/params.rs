//! Parameters handed to an extraction backend

use crate::document::FewShotExample;
use std::fmt;

/// Normalized arguments for one extraction call
///
/// Every optional knob stays `None` unless the caller supplied it, so the
/// backend applies its own default only when a value is truly absent. An
/// explicit `Some(0)` is forwarded as-is.
#[derive(Clone, Default, PartialEq)]
pub struct ExtractParams {
    /// Natural-language description of what to extract
    pub prompt_description: String,

    /// Few-shot examples, in caller order
    pub examples: Vec<FewShotExample>,

    /// Model identifier (already defaulted by the caller)
    pub model_id: String,

    /// Provider credential, if one was resolved
    pub api_key: Option<String>,

    /// Number of independent extraction passes
    pub extraction_passes: Option<u32>,

    /// Maximum concurrent model calls within one document
    pub max_workers: Option<u32>,

    /// Maximum characters per chunk
    pub max_char_buffer: Option<u32>,

    /// Attach internal diagnostics to results
    pub debug: Option<bool>,
}

impl fmt::Debug for ExtractParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractParams")
            .field("prompt_description", &self.prompt_description)
            .field("examples", &self.examples.len())
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extraction_passes", &self.extraction_passes)
            .field("max_workers", &self.max_workers)
            .field("max_char_buffer", &self.max_char_buffer)
            .field("debug", &self.debug)
            .finish()
    }
}
