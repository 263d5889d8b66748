//! Parse model output into extraction candidates

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use tracing::warn;

/// One extraction as the model reported it, before alignment
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Class label
    pub extraction_class: String,
    /// Span text
    pub extraction_text: String,
    /// Attributes
    pub attributes: Map<String, Value>,
}

/// Parse a model response into candidates
///
/// Accepts `{"extractions": [...]}` or a bare array. Items may use the
/// explicit `extraction_class`/`extraction_text` keys or the compact
/// `{"<class>": "<text>", "<class>_attributes": {...}}` form. Malformed items
/// are skipped; output that is not JSON at all is an error.
pub fn parse_model_output(response: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let json_str = strip_code_fence(response);

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("extractions") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ExtractorError::InvalidFormat(
                    "'extractions' is not an array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ExtractorError::InvalidFormat(
                "Expected a JSON object or array".to_string(),
            ))
        }
    };

    let mut candidates = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match parse_item(item) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!("Skipping extraction {}: {}", idx, e),
        }
    }

    Ok(candidates)
}

/// Remove a surrounding markdown code block, if any
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening line (``` or ```json) and the closing fence
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn parse_item(item: &Value) -> Result<Candidate, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| "Extraction is not a JSON object".to_string())?;

    if obj.contains_key("extraction_class") {
        return parse_explicit(obj);
    }
    parse_compact(obj)
}

fn parse_explicit(obj: &Map<String, Value>) -> Result<Candidate, String> {
    let extraction_class = non_empty_str(obj.get("extraction_class"), "extraction_class")?;
    let extraction_text = non_empty_str(obj.get("extraction_text"), "extraction_text")?;
    let attributes = attributes_of(obj.get("attributes"));

    Ok(Candidate {
        extraction_class,
        extraction_text,
        attributes,
    })
}

fn parse_compact(obj: &Map<String, Value>) -> Result<Candidate, String> {
    let mut spans = obj.iter().filter(|(key, _)| !key.ends_with("_attributes"));
    let (class, text) = match (spans.next(), spans.next()) {
        (Some(span), None) => span,
        _ => return Err("Expected exactly one class key".to_string()),
    };

    let extraction_text = non_empty_str(Some(text), class)?;
    let attributes = attributes_of(obj.get(&format!("{}_attributes", class)));

    Ok(Candidate {
        extraction_class: class.clone(),
        extraction_text,
        attributes,
    })
}

fn non_empty_str(value: Option<&Value>, field: &str) -> Result<String, String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(format!("Missing or invalid '{}'", field)),
    }
}

fn attributes_of(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
