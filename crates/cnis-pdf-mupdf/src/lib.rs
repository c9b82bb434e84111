use std::path::Path;

use mupdf::{Document, Page, TextPageFlags};

use cnis_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island. It isolates the mupdf dependency
/// (which is AGPL-3.0) so that plain-text code paths do not transitively
/// depend on it.
///
/// CNIS statements are tables. MuPDF reports each cell as its own text
/// line, often in separate blocks, so the lines of a page are regrouped into
/// visual rows (same vertical band, left to right) and the cells of a row are
/// joined with two spaces. Downstream column splitting relies on that gap.
///
/// Header and footer exclusion are off by default: the first page header
/// carries the holder identification.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }
}

/// One text line as MuPDF reports it, with its box.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub x0: f32,
    pub y0: f32,
    pub y1: f32,
    pub text: String,
}

impl Fragment {
    fn mid(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }
}

/// Group fragments into rows and render one row per line.
///
/// Two fragments share a row when the vertical midpoint of one falls within
/// half a line height of the row's first fragment.
pub fn assemble_rows(mut fragments: Vec<Fragment>) -> String {
    fragments.retain(|f| !f.text.trim().is_empty());
    fragments.sort_by(|a, b| a.mid().total_cmp(&b.mid()).then(a.x0.total_cmp(&b.x0)));

    let mut rows: Vec<Vec<Fragment>> = Vec::new();
    for fragment in fragments {
        match rows.last_mut() {
            Some(row)
                if (fragment.mid() - row[0].mid()).abs()
                    <= row[0].height().max(fragment.height()) / 2.0 =>
            {
                row.push(fragment)
            }
            _ => rows.push(vec![fragment]),
        }
    }

    let mut out = String::new();
    for mut row in rows {
        row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        let cells: Vec<&str> = row.iter().map(|f| f.text.trim()).collect();
        out.push_str(&cells.join("  "));
        out.push('\n');
    }
    out
}

impl MupdfBackend {
    fn page_fragments(&self, page: &Page) -> Result<Vec<Fragment>, mupdf::Error> {
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let page_bounds = page.bounds()?;
        let page_height = page_bounds.y1 - page_bounds.y0;
        let header_threshold = self
            .header_exclusion_ratio
            .map(|r| page_bounds.y0 + page_height * r);
        let footer_threshold = self
            .footer_exclusion_ratio
            .map(|r| page_bounds.y1 - page_height * r);

        let mut fragments = Vec::new();
        for block in text_page.blocks() {
            let block_bounds = block.bounds();
            if header_threshold.is_some_and(|t| block_bounds.y1 <= t)
                || footer_threshold.is_some_and(|t| block_bounds.y0 >= t)
            {
                continue;
            }

            for line in block.lines() {
                let bounds = line.bounds();
                fragments.push(Fragment {
                    x0: bounds.x0,
                    y0: bounds.y0,
                    y1: bounds.y1,
                    text: line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect(),
                });
            }
        }
        Ok(fragments)
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let open_error = |reason: String| BackendError::Open {
            path: path.to_path_buf(),
            reason,
        };
        let path_str = path
            .to_str()
            .ok_or_else(|| open_error("invalid path encoding".into()))?;
        let document = Document::open(path_str).map_err(|e| open_error(e.to_string()))?;

        let mut pages_text = Vec::new();
        for (index, page_result) in document
            .pages()
            .map_err(|e| open_error(e.to_string()))?
            .enumerate()
        {
            let page_error = |e: mupdf::Error| BackendError::Page {
                page: index + 1,
                reason: e.to_string(),
            };
            let page = page_result.map_err(page_error)?;
            let fragments = self.page_fragments(&page).map_err(page_error)?;
            tracing::trace!(page = index + 1, fragments = fragments.len(), "page text collected");
            pages_text.push(assemble_rows(fragments));
        }

        tracing::debug!(path = %path.display(), pages = pages_text.len(), "extracted PDF text");
        Ok(pages_text.join("\n"))
    }
}
