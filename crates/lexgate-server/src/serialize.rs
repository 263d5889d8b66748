//! Result documents to response JSON.

use lexgate_domain::{document_to_value, AnnotatedDocument};
use serde_json::Value;

/// Body of a successful `/extract` response
///
/// A single-string request gets a bare object under `data`, a list request
/// gets an array of the same length and order.
pub fn extract_response(
    docs: &[AnnotatedDocument],
    single: bool,
    debug: bool,
) -> Result<Value, serde_json::Error> {
    let mut values = docs
        .iter()
        .map(|doc| document_to_value(doc, debug))
        .collect::<Result<Vec<_>, _>>()?;

    let data = match (single, values.len()) {
        (true, 1) => values.remove(0),
        _ => Value::Array(values),
    };

    let mut body = serde_json::Map::new();
    body.insert("data".to_string(), data);
    Ok(Value::Object(body))
}
