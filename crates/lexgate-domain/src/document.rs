//! Extraction inputs and results

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One labeled span inside a few-shot example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Class label (free-form, e.g. "medication")
    pub extraction_class: String,

    /// Span text as it appears in the example
    pub extraction_text: String,

    /// Free-form attributes attached to the span
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// One example guiding the extraction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    /// Example source text
    pub text: String,

    /// Records the model is expected to find in `text`
    #[serde(default)]
    pub extractions: Vec<ExtractionRecord>,
}

/// How precisely an extracted span was located in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum AlignmentStatus {
    /// The span text occurs verbatim
    MatchExact,
    /// The located span is wider than the extracted text
    MatchGreater,
    /// Only part of the extracted text could be located
    MatchLesser,
    /// Located after case-insensitive comparison
    MatchFuzzy,
}

impl AlignmentStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentStatus::MatchExact => "match_exact",
            AlignmentStatus::MatchGreater => "match_greater",
            AlignmentStatus::MatchLesser => "match_lesser",
            AlignmentStatus::MatchFuzzy => "match_fuzzy",
        }
    }
}

impl fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match_exact" => Ok(AlignmentStatus::MatchExact),
            "match_greater" => Ok(AlignmentStatus::MatchGreater),
            "match_lesser" => Ok(AlignmentStatus::MatchLesser),
            "match_fuzzy" => Ok(AlignmentStatus::MatchFuzzy),
            other => Err(format!("unknown alignment status: {}", other)),
        }
    }
}

impl TryFrom<String> for AlignmentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for AlignmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Half-open character range `[start_pos, end_pos)` within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharInterval {
    /// First character position (inclusive)
    pub start_pos: usize,
    /// Last character position (exclusive)
    pub end_pos: usize,
}

impl CharInterval {
    /// Whether two intervals share at least one character
    pub fn overlaps(&self, other: &CharInterval) -> bool {
        self.start_pos < other.end_pos && other.start_pos < self.end_pos
    }
}

/// One extraction in a result document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Class label
    pub extraction_class: String,

    /// Extracted text as the model produced it
    pub extraction_text: String,

    /// Location in the source document, when alignment succeeded
    pub char_interval: Option<CharInterval>,

    /// Alignment quality, when alignment succeeded
    pub alignment_status: Option<AlignmentStatus>,

    /// Position of this extraction in the document's extraction list
    pub extraction_index: usize,

    /// Chunk ordinal the extraction came from
    pub group_index: usize,

    /// Free-form attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Internal diagnostics attached to a document when debug is requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    /// Model that served the request
    pub model_id: String,
    /// Number of extraction passes performed
    pub passes: u32,
    /// Number of chunks the document was split into
    pub chunk_count: usize,
    /// Length of each raw model response, in call order
    pub raw_output_chars: Vec<usize>,
}

/// One document's complete extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    /// Identifier assigned by the backend
    pub document_id: String,

    /// Original document text
    pub text: String,

    /// Extractions in document order
    pub extractions: Vec<Extraction>,

    /// Debug-only diagnostics; the leading underscore marks it internal
    #[serde(rename = "_trace", default)]
    pub trace: Option<ExtractionTrace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_status_serializes_to_name() {
        let json = serde_json::to_string(&AlignmentStatus::MatchFuzzy).unwrap();
        assert_eq!(json, "\"match_fuzzy\"");
    }

    #[test]
    fn test_alignment_status_parses_names() {
        for status in [
            AlignmentStatus::MatchExact,
            AlignmentStatus::MatchGreater,
            AlignmentStatus::MatchLesser,
            AlignmentStatus::MatchFuzzy,
        ] {
            let parsed: AlignmentStatus =
                serde_json::from_value(Value::String(status.as_str().to_string())).unwrap();
            assert_eq!(parsed, status);
        }
        assert!("MATCH_EXACT".parse::<AlignmentStatus>().is_err());
    }

    #[test]
    fn test_interval_overlap() {
        let a = CharInterval { start_pos: 0, end_pos: 5 };
        let b = CharInterval { start_pos: 4, end_pos: 9 };
        let c = CharInterval { start_pos: 5, end_pos: 9 };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_example_defaults() {
        let example: FewShotExample =
            serde_json::from_str(r#"{"text": "Patient takes aspirin."}"#).unwrap();
        assert!(example.extractions.is_empty());

        let record: ExtractionRecord = serde_json::from_str(
            r#"{"extraction_class": "drug", "extraction_text": "aspirin"}"#,
        )
        .unwrap();
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_document_trace_field_name() {
        let doc = AnnotatedDocument {
            document_id: "doc_1".to_string(),
            text: "x".to_string(),
            extractions: vec![],
            trace: None,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("_trace").is_some());
        assert!(value.get("trace").is_none());
    }
}
