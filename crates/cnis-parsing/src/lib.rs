use std::path::Path;

use thiserror::Error;

mod classify;
pub mod config;
pub mod extractor;
pub mod fields;
pub mod gaps;
pub mod identifiers;
pub mod remuneration;
mod scanner;
pub mod text_processing;

pub use classify::LineKind;
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::CnisExtractor;
pub use remuneration::RemunerationMatch;
// Re-export domain types from core (canonical definitions live there)
pub use cnis_core::{
    BackendError, CnisDate, Competency, EmploymentRecord, Identification, ParseResult, PdfBackend,
    RelationshipType, Remuneration, SkipStats,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("no text to parse")]
    EmptyText,
    #[error("input is {size} bytes, limit is {limit}")]
    InputTooLarge { size: usize, limit: usize },
    #[error("input has {lines} lines, limit is {limit}")]
    TooManyLines { lines: usize, limit: usize },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Parse a statement's text with the default configuration.
pub fn parse(text: &str) -> ParseResult {
    CnisExtractor::new().parse(text)
}

/// Check text against the default input bounds.
pub fn validate_input(text: &str) -> Result<(), ParsingError> {
    CnisExtractor::new().validate_input(text)
}

/// Extract a statement from a PDF file using the given backend for text extraction.
///
/// Pipeline:
/// 1. Extract text from the PDF via `backend`
/// 2. Reject empty or oversized text
/// 3. Pull holder identification from labeled fields
/// 4. Fold the lines into employment records, closing each at the next trigger
/// 5. Compute expected and missing competencies per record
pub fn extract_from_pdf(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
) -> Result<ParseResult, ParsingError> {
    CnisExtractor::new()
        .extract_via_backend(pdf_path, backend)
        .map(|(result, _)| result)
}
