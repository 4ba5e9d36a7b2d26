//! Plain-text extraction from reference documents.
//!
//! PDFs are read page by page. A page that fails to extract contributes
//! empty text; it never aborts the rest of the document.

use std::path::Path;
use tracing::{debug, trace};
use tripcover_core::error::CorpusError;

/// Turns a document on disk into plain text.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, CorpusError>;
}

/// Dispatches on file extension: `.pdf` through lopdf, `.txt`/`.md` read as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardExtractor;

impl DocumentExtractor for StandardExtractor {
    fn extract(&self, path: &Path) -> Result<String, CorpusError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => extract_pdf(path),
            "txt" | "md" => std::fs::read_to_string(path)
                .map(|text| text.trim().to_string())
                .map_err(|e| unreadable(path, e)),
            _ => Err(CorpusError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Extract every page of a PDF, joined with newlines.
pub fn extract_pdf(path: &Path) -> Result<String, CorpusError> {
    let doc = lopdf::Document::load(path).map_err(|e| unreadable(path, e))?;
    let pages = doc.get_pages();
    debug!(path = %path.display(), pages = pages.len(), "Extracting PDF text");

    let texts = pages.keys().map(|&number| match doc.extract_text(&[number]) {
        Ok(text) => Some(text),
        Err(e) => {
            trace!(page = number, error = %e, "Page text extraction failed");
            None
        }
    });

    Ok(join_pages(texts))
}

/// Join per-page text in document order; failed pages count as empty.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> CorpusError {
    CorpusError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
