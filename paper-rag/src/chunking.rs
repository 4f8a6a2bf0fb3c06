//! Paragraph chunking of extracted page text.
//!
//! This module provides the [`Chunker`] trait and [`ParagraphChunker`], which
//! splits every page on blank-line boundaries (`\n\n`) and tags each
//! paragraph with its page and document title.

use crate::document::{PageText, TextChunk};

/// Paragraph separator in extracted page text.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// A strategy for splitting a document's pages into chunks.
///
/// Implementations must be deterministic: the same pages and title always
/// produce the same chunk sequence, ordered by page then position on the page.
pub trait Chunker: Send + Sync {
    /// Split the pages of one document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, pages: &[PageText], title: &str, document_id: &str) -> Vec<TextChunk>;
}

/// Splits each page into paragraphs on `\n\n`.
///
/// Paragraphs that are empty or whitespace-only are dropped unless
/// [`keep_blank`](ParagraphChunker::keep_blank) is used. Kept paragraphs are
/// stored verbatim.
///
/// # Example
///
/// ```rust,ignore
/// use paper_rag::ParagraphChunker;
///
/// let chunker = ParagraphChunker::new();
/// let chunks = chunker.chunk(&pages, "Attention Is All You Need", "ABCD1234");
/// ```
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    filter_blank: bool,
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self { filter_blank: true }
    }
}

impl ParagraphChunker {
    /// Create a chunker that drops blank paragraphs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker that keeps blank paragraphs as chunks.
    pub fn keep_blank() -> Self {
        Self { filter_blank: false }
    }
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, pages: &[PageText], title: &str, document_id: &str) -> Vec<TextChunk> {
        let mut ordered: Vec<&PageText> = pages.iter().collect();
        // Loaders already return pages in order; sort_by_key is stable so
        // paragraph order within a page is untouched.
        ordered.sort_by_key(|p| p.page);

        let mut chunks = Vec::new();
        for page in ordered {
            if page.text.is_empty() {
                continue;
            }
            for paragraph in page.text.split(PARAGRAPH_SEPARATOR) {
                if self.filter_blank && paragraph.trim().is_empty() {
                    continue;
                }
                chunks.push(TextChunk {
                    page: page.page,
                    text: paragraph.to_string(),
                    title: title.to_string(),
                    document_id: document_id.to_string(),
                });
            }
        }
        chunks
    }
}
