use cnis_parsing::CnisExtractor;
use cnis_pdf_mupdf::MupdfBackend;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub extractor: CnisExtractor,
    pub backend: MupdfBackend,
}
