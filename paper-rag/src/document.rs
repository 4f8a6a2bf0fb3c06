//! Data types for library records, page text, chunks, and ranked results.

use serde::{Deserialize, Serialize};

/// A PDF attachment in the reference library, joined with its parent item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperRecord {
    /// Title of the parent item.
    pub title: String,
    /// Item type of the parent (e.g. `journalArticle`).
    pub item_type: String,
    /// Publication the parent appeared in, empty if unknown.
    pub publication: String,
    /// DOI of the parent, empty if unknown.
    pub doi: String,
    /// Key of the PDF attachment; names its storage directory.
    pub document_id: String,
    /// Key of the parent item.
    pub parent_id: String,
}

/// A named collection in the reference library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    /// Collection key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Number of items in the collection, as reported by the library.
    pub item_count: u64,
}

/// Raw text extracted from one page of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    /// Extracted text.
    pub text: String,
}

/// A paragraph of document text, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based page the paragraph came from.
    pub page: u32,
    /// Paragraph text.
    pub text: String,
    /// Title of the document the paragraph came from.
    pub title: String,
    /// Library identifier of the document.
    pub document_id: String,
}

/// The ordered chunks of every selected document for one query.
///
/// Chunks of one document are page-ascending and documents appear in
/// selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<TextChunk>,
}

impl Corpus {
    /// Append the chunks of the next selected document.
    pub fn extend(&mut self, fragment: Vec<TextChunk>) {
        self.chunks.extend(fragment);
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl From<Vec<TextChunk>> for Corpus {
    fn from(chunks: Vec<TextChunk>) -> Self {
        Self { chunks }
    }
}

/// An embedding vector for a chunk or a query.
pub type EmbeddingVector = Vec<f32>;

/// A retrieved [`TextChunk`] paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    /// The retrieved chunk.
    pub chunk: TextChunk,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message sent to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// The outcome of a successful question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Text returned by the generation backend.
    pub answer: String,
    /// The ranked chunks the answer was grounded on.
    pub sources: Vec<RankedResult>,
    /// Documents skipped because no PDF was found.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped_documents: Vec<String>,
}
