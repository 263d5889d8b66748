//! Self-contained HTML report for annotated documents

use lexgate_domain::{strip_internal, AnnotatedDocument, Extraction};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

const PALETTE: &[&str] = &[
    "#D2E3FC", "#C8E6C9", "#FEF0C3", "#F9DEDC", "#FFDDBE", "#EADDFF", "#C4E9E4", "#FCE4EC",
    "#E8EAED", "#DDE8C9",
];

const STYLE: &str = r#"body { font-family: sans-serif; margin: 2rem; color: #202124; }
.doc { border: 1px solid #dadce0; border-radius: 8px; padding: 1rem; margin-bottom: 2rem; }
.text { white-space: pre-wrap; line-height: 1.6; }
mark { border-radius: 3px; padding: 0 2px; }
.legend span { display: inline-block; margin-right: 0.5rem; padding: 2px 6px; border-radius: 3px; }
table { border-collapse: collapse; margin-top: 1rem; }
td, th { border: 1px solid #dadce0; padding: 4px 8px; text-align: left; vertical-align: top; }"#;

/// Render documents into one HTML page
///
/// Aligned extractions are highlighted in the text, one colour per class.
/// Overlapping spans after the first are listed in the table but not
/// highlighted. Attribute keys starting with `_` are shown only with `debug`.
pub fn render_html(documents: &[AnnotatedDocument], debug: bool) -> String {
    let classes: BTreeSet<&str> = documents
        .iter()
        .flat_map(|d| d.extractions.iter())
        .map(|e| e.extraction_class.as_str())
        .collect();
    let colours: HashMap<&str, &str> = classes
        .iter()
        .enumerate()
        .map(|(i, class)| (*class, PALETTE[i % PALETTE.len()]))
        .collect();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Extraction Report</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n<h1>Extraction Report</h1>\n");

    if !classes.is_empty() {
        html.push_str("<div class=\"legend\">");
        for class in &classes {
            let _ = write!(
                html,
                "<span style=\"background:{}\">{}</span>",
                colours[class],
                html_escape(class)
            );
        }
        html.push_str("</div>\n");
    }

    for doc in documents {
        render_document(&mut html, doc, &colours, debug);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_document(
    html: &mut String,
    doc: &AnnotatedDocument,
    colours: &HashMap<&str, &str>,
    debug: bool,
) {
    let _ = write!(
        html,
        "<section class=\"doc\">\n<h2>{}</h2>\n<div class=\"text\">",
        html_escape(&doc.document_id)
    );
    html.push_str(&highlight(&doc.text, &doc.extractions, colours));
    html.push_str("</div>\n");

    if !doc.extractions.is_empty() {
        html.push_str(
            "<table>\n<tr><th>#</th><th>Class</th><th>Text</th><th>Position</th><th>Status</th><th>Attributes</th></tr>\n",
        );
        for e in &doc.extractions {
            let position = e
                .char_interval
                .map(|iv| format!("{}..{}", iv.start_pos, iv.end_pos))
                .unwrap_or_default();
            let status = e.alignment_status.map(|s| s.as_str()).unwrap_or("unaligned");
            let mut attributes = Value::Object(e.attributes.clone());
            if !debug {
                strip_internal(&mut attributes);
            }
            let attributes = match &attributes {
                Value::Object(map) if map.is_empty() => String::new(),
                other => other.to_string(),
            };
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                e.extraction_index,
                html_escape(&e.extraction_class),
                html_escape(&e.extraction_text),
                position,
                status,
                html_escape(&attributes)
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("</section>\n");
}

/// Escaped document text with `<mark>` around aligned spans
fn highlight(text: &str, extractions: &[Extraction], colours: &HashMap<&str, &str>) -> String {
    // Character positions to byte offsets; the extra entry maps end-of-text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let byte_at = |pos: usize| offsets.get(pos).copied();

    let mut spans: Vec<(usize, usize, &str)> = extractions
        .iter()
        .filter_map(|e| {
            let iv = e.char_interval?;
            let start = byte_at(iv.start_pos)?;
            let end = byte_at(iv.end_pos)?;
            (start < end).then_some((start, end, e.extraction_class.as_str()))
        })
        .collect();
    spans.sort_by_key(|(start, _, _)| *start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, class) in spans {
        if start < cursor {
            continue;
        }
        out.push_str(&html_escape(&text[cursor..start]));
        let _ = write!(
            out,
            "<mark style=\"background:{}\" title=\"{}\">{}</mark>",
            colours.get(class).copied().unwrap_or(PALETTE[0]),
            html_escape(class),
            html_escape(&text[start..end])
        );
        cursor = end;
    }
    out.push_str(&html_escape(&text[cursor..]));
    out
}

/// Escape text for inclusion in HTML content or attributes
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
