//! PDF discovery and per-page text extraction.
//!
//! A reference library stores each attachment in its own directory named
//! after the attachment key: `storage_root/<document_id>/<file>.pdf`.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::PageText;
use crate::error::{RagError, Result};

/// What to do when a single page's text cannot be extracted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PagePolicy {
    /// Fail the whole document.
    #[default]
    Strict,
    /// Skip the page with a warning, as long as at least one page is readable.
    SkipUnreadable,
}

/// Loads the per-page text of a stored document.
pub trait DocumentLoader: Send + Sync {
    /// Load the pages of `document_id` from `storage_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the document has no file, and
    /// [`RagError::DocumentRead`] if the file cannot be parsed.
    fn load(&self, storage_root: &Path, document_id: &str) -> Result<Vec<PageText>>;
}

/// Loads PDF attachments.
///
/// Text is laid out with `pdf-extract`, which turns large vertical gaps into
/// blank lines so that paragraphs survive extraction. `lopdf` enumerates the
/// pages and, under [`PagePolicy::SkipUnreadable`], reads them one by one when
/// layout extraction fails for the document.
///
/// The file is read fully into memory, parsed, and released before
/// [`load`](DocumentLoader::load) returns.
#[derive(Debug, Clone, Default)]
pub struct PdfLoader {
    page_policy: PagePolicy,
}

impl PdfLoader {
    /// Create a loader that fails on any unreadable page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unreadable-page policy.
    pub fn with_page_policy(mut self, policy: PagePolicy) -> Self {
        self.page_policy = policy;
        self
    }
}

/// Locate the PDF for `document_id`.
///
/// When the directory holds several PDFs the lexicographically smallest file
/// name is chosen so the result does not depend on directory listing order.
///
/// # Errors
///
/// Returns [`RagError::NotFound`] if the directory does not exist or holds no
/// `.pdf` file, and [`RagError::Config`] for identifiers that are not a single
/// path component.
pub fn find_pdf(storage_root: &Path, document_id: &str) -> Result<PathBuf> {
    if document_id.is_empty()
        || document_id == "."
        || document_id == ".."
        || document_id.contains(['/', '\\'])
    {
        return Err(RagError::Config(format!("invalid document id '{document_id}'")));
    }

    let dir = storage_root.join(document_id);
    let not_found = || RagError::NotFound {
        document_id: document_id.to_string(),
        location: dir.display().to_string(),
    };

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => {
            return Err(RagError::DocumentRead {
                path: dir.clone(),
                message: format!("cannot list directory: {e}"),
            });
        }
    };

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();

    if pdfs.len() > 1 {
        debug!(
            document.id = document_id,
            candidates = pdfs.len(),
            "several PDFs, using the first by name"
        );
    }
    pdfs.into_iter().next().ok_or_else(not_found)
}

/// Gather extracted pages according to `policy`.
///
/// `pages` yields `(page_number, extraction result)` in page order.
fn collect_pages<I>(pages: I, policy: PagePolicy) -> std::result::Result<Vec<PageText>, String>
where
    I: IntoIterator<Item = (u32, std::result::Result<String, String>)>,
{
    let mut collected = Vec::new();
    let mut skipped = 0usize;

    for (page, result) in pages {
        match (result, policy) {
            (Ok(text), _) => collected.push(PageText { page, text }),
            (Err(e), PagePolicy::Strict) => return Err(format!("page {page}: {e}")),
            (Err(e), PagePolicy::SkipUnreadable) => {
                warn!(page, error = %e, "skipping unreadable page");
                skipped += 1;
            }
        }
    }

    if collected.is_empty() && skipped > 0 {
        return Err(format!("none of the {skipped} pages could be read"));
    }
    Ok(collected)
}

impl DocumentLoader for PdfLoader {
    fn load(&self, storage_root: &Path, document_id: &str) -> Result<Vec<PageText>> {
        let path = find_pdf(storage_root, document_id)?;
        let read_error =
            |message: String| RagError::DocumentRead { path: path.clone(), message };

        let bytes =
            std::fs::read(&path).map_err(|e| read_error(format!("cannot read file: {e}")))?;
        let document = lopdf::Document::load_mem(&bytes)
            .map_err(|e| read_error(format!("cannot parse PDF: {e}")))?;
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

        // Layout-aware extraction keeps blank lines between paragraphs.
        let extracted: Vec<(u32, std::result::Result<String, String>)> =
            match pdf_extract::extract_text_from_mem_by_pages(&bytes) {
                Ok(texts) if texts.len() == page_numbers.len() => {
                    page_numbers.iter().copied().zip(texts.into_iter().map(Ok)).collect()
                }
                layout => {
                    let reason = match layout {
                        Err(e) => e.to_string(),
                        Ok(texts) => {
                            format!("{} texts for {} pages", texts.len(), page_numbers.len())
                        }
                    };
                    if self.page_policy == PagePolicy::Strict {
                        return Err(read_error(format!("cannot extract text: {reason}")));
                    }
                    warn!(
                        document.id = document_id,
                        %reason,
                        "layout extraction failed, reading pages without paragraph breaks"
                    );
                    page_numbers
                        .iter()
                        .map(|&n| (n, document.extract_text(&[n]).map_err(|e| e.to_string())))
                        .collect()
                }
            };
        drop(bytes);

        let pages = collect_pages(extracted, self.page_policy).map_err(read_error)?;

        info!(
            document.id = document_id,
            path = %path.display(),
            page_count = page_numbers.len(),
            pages_read = pages.len(),
            "loaded document"
        );
        Ok(pages)
    }
}
