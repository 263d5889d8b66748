//! Backend invocation, one document at a time.

use crate::normalize::NormalizedCall;
use lexgate_domain::{AnnotatedDocument, BackendError, ExtractionBackend};
use tracing::{debug, info};

/// Run the backend over every document in input order
///
/// The first failure aborts the whole call; nothing is retried.
pub async fn invoke(
    backend: &dyn ExtractionBackend,
    call: &NormalizedCall,
) -> Result<Vec<AnnotatedDocument>, BackendError> {
    info!(
        model = %call.params.model_id,
        documents = call.documents.len(),
        "Running extraction"
    );

    let mut results = Vec::with_capacity(call.documents.len());
    for (index, text) in call.documents.iter().enumerate() {
        debug!(document = index, chars = text.chars().count(), "Extracting document");
        results.push(backend.extract(text, &call.params).await?);
    }
    Ok(results)
}
