//! JSON Lines persistence for annotated documents

use crate::error::ExtractorError;
use lexgate_domain::{encode_jsonl, AnnotatedDocument};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Write documents to `path` as JSON Lines
///
/// The file must not already exist. Internal `_` fields are written only with
/// `debug`.
pub async fn save_documents(
    documents: &[AnnotatedDocument],
    path: &Path,
    debug: bool,
) -> Result<(), ExtractorError> {
    let encoded = encode_jsonl(documents, debug)?;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(encoded.as_bytes()).await?;
    file.flush().await?;

    debug!("Saved {} documents to {}", documents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgate_domain::ExtractionTrace;

    fn doc(id: &str, text: &str) -> AnnotatedDocument {
        AnnotatedDocument {
            document_id: id.to_string(),
            text: text.to_string(),
            extractions: Vec::new(),
            trace: Some(ExtractionTrace {
                model_id: "mock-model".to_string(),
                passes: 1,
                chunk_count: 1,
                raw_output_chars: vec![2],
            }),
        }
    }

    #[tokio::test]
    async fn test_save_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extractions.jsonl");

        save_documents(&[doc("a", "x")], &path, false).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);

        assert!(save_documents(&[doc("b", "y")], &path, false).await.is_err());
    }

    #[tokio::test]
    async fn test_saved_bytes_match_shared_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let docs = [doc("a", "first"), doc("b", "second")];

        for debug in [false, true] {
            let path = dir.path().join(format!("run_{}.jsonl", debug));
            save_documents(&docs, &path, debug).await.unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert_eq!(written, encode_jsonl(&docs, debug).unwrap());
            assert_eq!(written.contains("_trace"), debug);
        }
    }
}
