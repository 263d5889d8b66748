//! The JSON form of annotated documents
//!
//! Responses, JSON Lines artifacts and reports all go through
//! [`document_to_value`], so a single `debug` flag decides whether internal
//! `_`-prefixed fields are visible everywhere a document is shown.

use crate::document::AnnotatedDocument;
use serde_json::Value;

/// Convert one document to JSON, dropping `_`-prefixed keys unless `debug`
pub fn document_to_value(doc: &AnnotatedDocument, debug: bool) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(doc)?;
    if !debug {
        strip_internal(&mut value);
    }
    Ok(value)
}

/// Recursively remove object keys that start with `_`
pub fn strip_internal(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with('_'));
            for child in map.values_mut() {
                strip_internal(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_internal(item);
            }
        }
        _ => {}
    }
}

/// Encode documents as JSON Lines: one compact line per document, in order,
/// each terminated by `\n`
pub fn encode_jsonl(documents: &[AnnotatedDocument], debug: bool) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for doc in documents {
        out.push_str(&serde_json::to_string(&document_to_value(doc, debug)?)?);
        out.push('\n');
    }
    Ok(out)
}
