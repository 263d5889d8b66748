//! Few-shot prompt construction

use lexgate_domain::{ExtractionRecord, FewShotExample};
use serde::Serialize;

/// Builds the per-chunk extraction prompt
///
/// The description and examples are rendered once; only the chunk text
/// changes between calls.
pub struct PromptBuilder {
    preamble: String,
}

#[derive(Serialize)]
struct ExampleAnswer<'a> {
    extractions: &'a [ExtractionRecord],
}

impl PromptBuilder {
    /// Create a builder from the task description and few-shot examples
    pub fn new(description: &str, examples: &[FewShotExample]) -> Self {
        let mut preamble = String::new();

        preamble.push_str(description.trim());
        preamble.push_str("\n\n");
        preamble.push_str(OUTPUT_RULES);
        preamble.push_str("\n\n");

        if !examples.is_empty() {
            preamble.push_str("Examples\n\n");
            for example in examples {
                let answer = ExampleAnswer {
                    extractions: &example.extractions,
                };
                // Serializing plain records into a String cannot fail
                let answer_json =
                    serde_json::to_string(&answer).unwrap_or_else(|_| "{}".to_string());
                preamble.push_str("Q: ");
                preamble.push_str(&example.text);
                preamble.push_str("\nA: ");
                preamble.push_str(&answer_json);
                preamble.push_str("\n\n");
            }
        }

        Self { preamble }
    }

    /// Prompt for one chunk of text
    pub fn render(&self, chunk: &str) -> String {
        format!("{}Q: {}\nA: ", self.preamble, chunk)
    }
}

const OUTPUT_RULES: &str = r#"Respond with a single JSON object of the form:
{"extractions": [{"extraction_class": "...", "extraction_text": "...", "attributes": {}}]}

Rules:
- extraction_text must be copied exactly from the input text, never paraphrased
- List extractions in the order they appear in the text
- Do not extract overlapping spans
- Return ONLY JSON, no markdown code blocks, no explanations"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn example() -> FewShotExample {
        let mut attributes = Map::new();
        attributes.insert("dose".to_string(), json!("81mg"));
        FewShotExample {
            text: "Patient takes aspirin 81mg daily.".to_string(),
            extractions: vec![ExtractionRecord {
                extraction_class: "medication".to_string(),
                extraction_text: "aspirin".to_string(),
                attributes,
            }],
        }
    }

    #[test]
    fn test_prompt_includes_description_and_text() {
        let builder = PromptBuilder::new("Extract medications.", &[]);
        let prompt = builder.render("Take ibuprofen.");
        assert!(prompt.starts_with("Extract medications."));
        assert!(prompt.ends_with("Q: Take ibuprofen.\nA: "));
        assert!(!prompt.contains("Examples"));
    }

    #[test]
    fn test_prompt_includes_examples_as_json() {
        let builder = PromptBuilder::new("Extract medications.", &[example()]);
        let prompt = builder.render("Take ibuprofen.");
        assert!(prompt.contains("Q: Patient takes aspirin 81mg daily."));
        assert!(prompt.contains(
            r#"A: {"extractions":[{"extraction_class":"medication","extraction_text":"aspirin","attributes":{"dose":"81mg"}}]}"#
        ));
    }

    #[test]
    fn test_examples_precede_chunk() {
        let builder = PromptBuilder::new("Extract.", &[example()]);
        let prompt = builder.render("CHUNK");
        let example_at = prompt.find("aspirin").unwrap();
        let chunk_at = prompt.find("CHUNK").unwrap();
        assert!(example_at < chunk_at);
    }
}
