//! On-disk artifacts for `/visualize` and read-back through `/artifacts/html`.
//!
//! Every visualize call gets its own run directory under the configured root:
//!
//! ```text
//! <root>/run_<YYYYmmddTHHMMSSZ>_<8 hex>/extractions.jsonl
//! <root>/run_<YYYYmmddTHHMMSSZ>_<8 hex>/report.html
//! ```

use chrono::Utc;
use lexgate_domain::{
    document_to_value, encode_jsonl, AnnotatedDocument, BackendError, ExtractionBackend,
};
use lexgate_extractor::html_escape;
use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// JSON Lines file name inside a run directory
pub const JSONL_FILE: &str = "extractions.jsonl";

/// HTML report file name inside a run directory
pub const HTML_FILE: &str = "report.html";

/// Artifact errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem failure while writing or reading artifacts
    #[error("Artifact I/O error: {0}")]
    Io(#[from] io::Error),

    /// Documents could not be encoded
    #[error("Failed to encode documents: {0}")]
    Encode(#[from] serde_json::Error),

    /// Requested path resolves outside the artifacts root
    #[error("Path is outside artifacts directory")]
    OutsideRoot,

    /// Requested report does not exist
    #[error("Not found")]
    NotFound,
}

/// Paths written by one visualize call, all absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunArtifact {
    /// Run directory
    pub run_dir: String,
    /// JSON Lines file
    pub jsonl: String,
    /// HTML report
    pub html: String,
}

/// The artifacts root and the operations allowed on it
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create the root if needed and pin it to its canonical path
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let root = std::fs::canonicalize(dir.as_ref())?;
        Ok(Self { root })
    }

    /// Canonical artifacts root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one visualize call's documents and report
    ///
    /// Both files show the documents as `/extract` would for the same
    /// `debug`. Either every file is written or the run directory is removed
    /// again.
    pub async fn write_run(
        &self,
        backend: &dyn ExtractionBackend,
        documents: &[AnnotatedDocument],
        debug: bool,
    ) -> Result<RunArtifact, ArtifactError> {
        let run_dir = self.root.join(run_dir_name());
        // create_dir, not create_dir_all: a name collision must fail
        tokio::fs::create_dir(&run_dir).await?;

        match write_run_files(&run_dir, backend, documents, debug).await {
            Ok(artifact) => {
                info!("Wrote {} documents to {}", documents.len(), artifact.run_dir);
                Ok(artifact)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_dir_all(&run_dir).await {
                    warn!(
                        "Failed to remove partial run directory {}: {}",
                        run_dir.display(),
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    /// Resolve a requested report path, enforcing containment in the root
    ///
    /// Relative paths are taken relative to the root. Paths that escape the
    /// root are rejected whether or not they exist.
    pub async fn resolve_html(&self, requested: &str) -> Result<PathBuf, ArtifactError> {
        let requested = Path::new(requested);
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let resolved = match tokio::fs::canonicalize(&candidate).await {
            Ok(real) => real,
            Err(_) => resolve_missing(&candidate).await,
        };

        if !resolved.starts_with(&self.root) {
            return Err(ArtifactError::OutsideRoot);
        }

        let is_html = resolved
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        let is_file = tokio::fs::metadata(&resolved)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if !is_html || !is_file {
            return Err(ArtifactError::NotFound);
        }
        Ok(resolved)
    }
}

async fn write_run_files(
    run_dir: &Path,
    backend: &dyn ExtractionBackend,
    documents: &[AnnotatedDocument],
    debug: bool,
) -> Result<RunArtifact, ArtifactError> {
    let jsonl_path = run_dir.join(JSONL_FILE);
    match backend.save_documents(documents, &jsonl_path, debug).await {
        Ok(()) => debug!("Backend saved {}", jsonl_path.display()),
        Err(e) => {
            if !matches!(e, BackendError::Unsupported(_)) {
                warn!("Backend save failed, writing JSONL directly: {}", e);
            }
            tokio::fs::write(&jsonl_path, encode_jsonl(documents, debug)?).await?;
        }
    }

    let html_path = run_dir.join(HTML_FILE);
    let html = match backend.render_html(documents, debug) {
        Ok(html) => html,
        Err(e) => {
            warn!("Report rendering failed, using fallback viewer: {}", e);
            fallback_viewer(documents, debug)?
        }
    };
    tokio::fs::write(&html_path, html).await?;

    Ok(RunArtifact {
        run_dir: run_dir.display().to_string(),
        jsonl: jsonl_path.display().to_string(),
        html: html_path.display().to_string(),
    })
}

/// `run_<UTC timestamp>_<8 random hex digits>`
fn run_dir_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("run_{}_{}", Utc::now().format("%Y%m%dT%H%M%SZ"), &id[..8])
}

/// Minimal report showing the documents as pretty-printed JSON
fn fallback_viewer(documents: &[AnnotatedDocument], debug: bool) -> Result<String, serde_json::Error> {
    let values = documents
        .iter()
        .map(|doc| document_to_value(doc, debug))
        .collect::<Result<Vec<_>, _>>()?;
    let pretty = serde_json::to_string_pretty(&values)?;

    Ok(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Extraction Report</title>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"></head>\
         <body style=\"font-family: ui-sans-serif, system-ui, sans-serif;\">\
         <h2>Extraction Report</h2><pre style=\"white-space: pre-wrap\">{}</pre></body></html>\n",
        html_escape(&pretty)
    ))
}

/// Best-effort real path for a path that does not exist
///
/// The deepest existing ancestor is canonicalized, so symlinked directories
/// are still followed, and the remaining components are applied lexically.
async fn resolve_missing(path: &Path) -> PathBuf {
    let normalized = normalize_lexically(path);
    let mut existing = normalized.as_path();
    let mut rest = Vec::new();

    loop {
        if let Ok(real) = tokio::fs::canonicalize(existing).await {
            return rest.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
