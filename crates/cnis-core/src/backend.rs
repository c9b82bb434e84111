use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("cannot read text of page {page}: {reason}")]
    Page { page: usize, reason: String },
}

/// Source of statement text.
///
/// Implementors turn a document into plain text: one line per visual row,
/// pages in order, cells of a row separated by at least two spaces so column
/// splitting still works. Record extraction lives in
/// `cnis_parsing::CnisExtractor`.
pub trait PdfBackend: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
